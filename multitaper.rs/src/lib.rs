//! Multitaper spectrograms of real-valued signals.
//!
//! Each segment of the signal is tapered with a set of Slepian tapers, every tapered
//! copy is turned into a power spectral density estimate and the estimates are
//! combined into one row of the spectrogram. See [`compute_spectrogram`] for the
//! configurable entry point and [`SpectrogramRequest`] for the positional one.

mod error;
pub use error::*;

mod config;
pub use config::*;

mod sample_rate;
pub use sample_rate::*;

mod transform_ctx;
pub use transform_ctx::*;

mod segments;
pub use segments::*;

mod detrend;

mod estimator;
pub use estimator::*;

mod averager;
pub use averager::*;

mod assembler;
pub use assembler::*;

mod cancel;
pub use cancel::*;

mod engine;
pub use engine::*;

mod request;
pub use request::*;

pub use dpss;
