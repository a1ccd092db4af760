//! Input data handling: format conversion, spectrum preparation and
//! synthetic spectra.

pub mod convert;
pub mod sample;
pub mod spectra;

pub use spectra::prepare_spectra;
