//! # FerroFlux Telegram Node
//!
//! Integration node that maps the declarative Telegram parameter schema onto
//! Telegram Bot API calls. The schema lives in `nodes/telegram.yaml`; the
//! execution side turns each input record into an endpoint + JSON body and
//! hands it to an [`dispatch::ApiDispatcher`].
//!

pub mod config;
pub mod credentials;
pub mod description;
pub mod dispatch;
pub mod node;
pub mod operations;
pub mod parameters;
pub mod records;
pub mod reply_markup;

pub use config::NodeConfig;
pub use credentials::{CredentialStore, EnvCredentialStore, StaticCredentialStore};
pub use description::NodeDescription;
pub use dispatch::{ApiDispatcher, HttpDispatcher};
pub use node::{NodeType, TelegramNode};
pub use operations::TelegramRequest;
pub use records::{InputRecord, OutputRecord};
