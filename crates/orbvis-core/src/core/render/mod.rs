//! # Render Module
//!
//! CPU rendering primitives: camera rays ([`camera`]), the RGBA+depth render
//! target ([`framebuffer`]), analytic ray/primitive intersection
//! ([`intersect`]), surface and light math ([`shading`]), scalar-field
//! marching ([`raymarch`]), and the assembled ball-and-stick scene
//! ([`scene`]). The engine's frame task drives these per pixel.

pub mod camera;
pub mod framebuffer;
pub mod intersect;
pub mod raymarch;
pub mod scene;
pub mod shading;
