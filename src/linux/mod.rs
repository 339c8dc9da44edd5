pub mod power;
pub mod sampler;

pub use sampler::LinuxSampler;
