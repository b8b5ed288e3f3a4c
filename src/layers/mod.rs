pub mod dense;

pub use dense::{ErrorSignal, Layer, LayerKind, Phase};
