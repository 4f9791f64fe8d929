//! Geometry builders for rectangular pyramid sensor volumes
//!
//! Pure functions producing unit-space vertex lists, plus the ellipsoid
//! mesh seam used for the dome.

pub mod sector;
pub mod ellipsoid;

pub use sector::{
    build_sector_loop, build_unit_arcs, max_zx_deviation, max_zy_deviation, scan_plane_fan,
    sector_line_vertices, segment_line_vertices, triangulate_fan, UnitArcs,
};
pub use ellipsoid::{EllipsoidMesh, EllipsoidMeshProvider, UnitSphereMeshProvider, DOME_PARTITIONS};
