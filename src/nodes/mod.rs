pub mod normalization;

pub use normalization::NormalizationNode;
