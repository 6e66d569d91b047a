//! Wire types shared by every `corestack-*` crate: the event envelope
//! appended to the durable log, the `(mode, stage)` lattice, and the static
//! model-alias registry.
//!
//! Everything here is data, not behavior: the event store owns durability,
//! the mode manager owns transition rules, the agentic loop owns model
//! resolution. This crate only defines the shapes they agree on so that
//! two crates never redefine the same wire type with subtly different
//! field names.

pub mod event;
pub mod fs_adapter;
pub mod message;
pub mod model_client;
pub mod model_registry;
pub mod token_counter;

pub use event::ApprovalDecision;
pub use event::ApprovalScope;
pub use event::BudgetDimension;
pub use event::DiffOperation;
pub use event::Event;
pub use event::EventPayload;
pub use event::EventType;
pub use event::Mode;
pub use event::RestoreMethod;
pub use event::Stage;
pub use event::VerifyStatus;
pub use fs_adapter::FileSystemAdapter;
pub use fs_adapter::LocalFileSystem;
pub use message::Content;
pub use message::ContentBlock;
pub use message::Message;
pub use message::Role;
pub use model_client::CreateMessageRequest;
pub use model_client::CreateMessageResponse;
pub use model_client::ModelClient;
pub use model_client::StopReason;
pub use model_client::StreamEvent;
pub use model_registry::ModelAlias;
pub use model_registry::resolve_model;
pub use token_counter::CountTokensRequest;
pub use token_counter::CountTokensResult;
pub use token_counter::TokenCounter;
pub use token_counter::estimate_tokens_sync;
