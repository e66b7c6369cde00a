use std::sync::Arc;

use crate::input::InputEdit;
use crate::store::UserRepository;
use crate::types::User;

/// Live store handle, written once when the connect command succeeds
pub type Connection = Arc<dyn UserRepository>;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,

    // List navigation
    CursorUp,
    CursorDown,
    Select,

    // Email entry
    InputChar(char),
    InputEdit(InputEdit),
    SubmitInput,
    ExitInput,

    // Connect command
    Connect,
    Connected(Connection),
    ConnectFailed(String),

    // Lookup command
    UserLoaded(Option<User>),
    LookupFailed(String),

    // Token command
    TokenFetched(String),
    FetchFailed(String),

    None,
}
