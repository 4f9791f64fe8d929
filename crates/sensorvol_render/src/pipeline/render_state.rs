//! Fixed-function state for sensor draw commands
//!
//! Translucent materials draw double-sided: a back-face pass followed by a
//! front-face pass, neither writing depth. Opaque materials draw once.

/// Face removed by culling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

impl CullFace {
    pub fn to_wgpu(self) -> wgpu::Face {
        match self {
            CullFace::Front => wgpu::Face::Front,
            CullFace::Back => wgpu::Face::Back,
        }
    }
}

/// Depth, blending and culling for one draw command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blending: bool,
    pub cull: Option<CullFace>,
}

impl RenderState {
    /// Alpha-blended, no depth writes
    pub fn translucent(cull: CullFace, depth_test: bool) -> Self {
        Self { depth_test, depth_write: false, blending: true, cull: Some(cull) }
    }

    /// Depth-written, back faces culled
    pub fn opaque(depth_test: bool) -> Self {
        Self { depth_test, depth_write: true, blending: false, cull: Some(CullFace::Back) }
    }

    pub fn depth_compare(&self) -> wgpu::CompareFunction {
        if self.depth_test {
            wgpu::CompareFunction::LessEqual
        } else {
            wgpu::CompareFunction::Always
        }
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        self.blending.then_some(wgpu::BlendState::ALPHA_BLENDING)
    }

    pub fn cull_mode(&self) -> Option<wgpu::Face> {
        self.cull.map(CullFace::to_wgpu)
    }
}

/// Front-face state and, for translucent materials, the back-face state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderStates {
    pub front: RenderState,
    pub back: Option<RenderState>,
}

impl RenderStates {
    pub fn is_double_sided(&self) -> bool {
        self.back.is_some()
    }
}

/// Render states for a material's translucency and the occlusion pass-through flag
pub fn build_render_states(translucent: bool, show_through_ellipsoid: bool) -> RenderStates {
    let depth_test = !show_through_ellipsoid;
    if translucent {
        RenderStates {
            front: RenderState::translucent(CullFace::Back, depth_test),
            back: Some(RenderState::translucent(CullFace::Front, depth_test)),
        }
    } else {
        RenderStates { front: RenderState::opaque(depth_test), back: None }
    }
}
