//! Slideshow rendering: the surface seam, the CPU surface and frame composition.

/// CPU surface backed by `vello_cpu` and `parley`.
pub mod cpu;
/// Frame composition and word wrapping.
pub mod frame;
/// `Surface` and `Presentation` traits.
pub mod surface;
