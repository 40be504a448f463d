/*!
Call signaling and session negotiation for one-to-one `WebRTC` video calls.

# Overview

Every endpoint keeps a connection to a small relay that assigns it an identifier,
keeps everybody informed about who else is online and forwards addressed messages
between endpoints. On top of that this crate runs the whole lifecycle of a single call:
placing it, answering it, trickling ICE candidates, hanging up, and cleaning up
after whichever side disappears first.

[`CallDispatcher`] is the entry point. It is generic over the three things it talks to,
the [relay connection](SignalingTransport), the [capture devices](MediaDevices) and the
[peer link factory](PeerLinkFactory), so the same state machine runs in the browser
(see `web`, available when compiling to `wasm32`) and against fakes in native tests.

```ignore
use wasm_call::{web, CallConfig, PeerId};

web::init_logging(log::Level::Debug);
let call = web::connect(CallConfig::default())?;
call.dispatcher().set_observer(|update| log::info!("{:?}", update));

// later, from a click handler
call.place_call(PeerId::from("peer-7"));
```
*/

#![allow(
    clippy::module_name_repetitions,
    clippy::future_not_send, // false positive in WASM (single threaded) context
)]
// clippy WARN level lints
#![warn(
    // missing_docs,
    clippy::cargo,
    clippy::pedantic,
    // clippy::nursery,
    clippy::dbg_macro,
    clippy::unwrap_used,
    clippy::integer_division,
    clippy::large_include_file,
    clippy::map_err_ignore,
    // clippy::missing_docs_in_private_items,
    clippy::panic,
    clippy::todo,
    clippy::undocumented_unsafe_blocks,
    clippy::unimplemented,
    clippy::unreachable
)]
// clippy WARN level lints, that can be upgraded to DENY if preferred
#![warn(
    clippy::float_arithmetic,
    clippy::arithmetic_side_effects,
    clippy::modulo_arithmetic,
    clippy::as_conversions,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::default_union_representation,
    clippy::deref_by_slicing,
    clippy::empty_drop,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::filetype_is_file,
    clippy::float_cmp_const,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::pattern_type_mismatch,
    clippy::string_slice,
    clippy::try_err
)]
// clippy DENY level lints, they always have a quick fix that should be preferred
#![deny(
    clippy::wildcard_imports,
    clippy::multiple_inherent_impl,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::self_named_module_files,
    clippy::separated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unseparated_literal_suffix,
    clippy::verbose_file_reads
)]

pub mod codec;
pub mod config;
mod dispatcher;
mod error;
pub mod media;
pub mod negotiation;
pub mod roster;
pub mod session;
pub mod transport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{CallConfig, ConnectionType, IceServer, MediaConstraints};
pub use dispatcher::{CallDispatcher, CallSnapshot, CallUpdate, EndReason};
pub use error::{Error, Result};
pub use media::MediaDevices;
pub use negotiation::{LinkEvent, LinkEvents, NegotiationEngine, PeerLink, PeerLinkFactory};
pub use session::CallPhase;
pub use transport::SignalingTransport;
pub use wasm_call_protocol::{
    ClientMessage, IceCandidate, PeerId, SdpType, ServerMessage, SessionDescription,
};
