//! Budgeted long-form script generation.
//!
//! A `ScriptGenerator` asks a language model for one bounded continuation at a
//! time, recounts every continuation locally, and folds it into a
//! `GenerationState` until the script is complete or the word budget is spent.
//! Only a rolling summary, never the full script, is sent back to the model.
//!
//! ## Modules
//!
//! | Module          | Purpose                                              |
//! |-----------------|------------------------------------------------------|
//! | `config`        | Provider endpoint, loop guards, overrun policy       |
//! | `contracts`     | `ContinuationResult` schema and fail-closed parsing  |
//! | `errors`        | `GenerationError` taxonomy                           |
//! | `generator`     | The generation loop                                  |
//! | `model`         | `ScriptModel` seam and the rig-backed client         |
//! | `prompts`       | Preamble and per-step prompt text                    |
//! | `state`         | `GenerationState`                                    |
//! | `state_machine` | Phase tracking with legal-transition guards          |
//! | `step`          | One continuation step                                |
//! | `words`         | Whitespace word counting and truncation              |

pub mod config;
pub mod contracts;
pub mod errors;
pub mod generator;
pub mod model;
pub mod prompts;
pub mod state;
pub mod state_machine;
pub mod step;
pub mod words;

pub use config::{GenerationConfig, OverrunPolicy, ProviderConfig, ScriptConfig};
pub use contracts::ContinuationResult;
pub use errors::{FailureCategory, GenerationError};
pub use generator::{GenerationOutcome, ScriptGenerator, TerminationReason};
pub use model::{ContinuationRequest, RigScriptModel, ScriptModel};
pub use state::GenerationState;
