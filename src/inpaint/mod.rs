pub mod handoff;
pub mod mask;
pub mod telea;

pub use handoff::MaskHandoff;
pub use mask::build_mask;
pub use telea::inpaint_telea;
