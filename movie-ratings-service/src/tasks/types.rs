pub mod session_keys {
    /// Number of completed tool rounds in this session
    pub const TOOL_ROUNDS: &str = "tool_rounds";
    pub const MOVIE_NAME: &str = "movie_name";
}
