//! # slicesim Slits
//!
//! Slit-pattern files for the slicer simulator. A file holds any number of
//! named patterns; each gives the slicer geometry and, optionally, explicit
//! field points for its slitlets.
//!
//! - **File parsers** ([`parsers`]) - JSON and TOML pattern files, chosen by
//!   extension.
//! - **Patterns** ([`pattern`]) - [`NamedSlitPattern`], the
//!   `slicesim_core::slit::SlitPattern` implementation handed to the
//!   simulator.
//!
//! ```json
//! {
//!   "patterns": [
//!     {
//!       "name": "default",
//!       "pattern_data": {
//!         "n_slitlets": 5,
//!         "slitlet_length": 2.0,
//!         "n_spaxels_per_slitlet": 10,
//!         "stack_wh_aspect_ratio": 1.0,
//!         "lenslet_to_stack_magnification": 4.0
//!       }
//!     }
//!   ]
//! }
//! ```

pub mod parsers;
pub mod pattern;

pub use parsers::{load_file, ParseError};
pub use pattern::{load_pattern, NamedSlitPattern, PatternEntry, SlitPatternFile};
