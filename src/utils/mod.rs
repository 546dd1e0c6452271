use once_cell::sync::OnceCell;
use rand::Rng;
use std::env;

static INIT_DOTENV: OnceCell<bool> = OnceCell::new();

/// Loads the env file named by the first command line argument (or `.env`)
/// into the process environment, at most once per process.
///
/// Returns the path that was tried. A missing file is not an error: the
/// variables may already be set by the environment.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::args().nth(1).unwrap_or_else(|| ".env".to_string());
    let loaded = *INIT_DOTENV.get_or_init(|| dotenv::from_filename(&dotenv_path).is_ok());
    if !loaded {
        tracing::debug!(path = %dotenv_path, "env file not found, using process environment");
    }
    dotenv_path
}

/// Draws a random six digit number, used to pair a user, an AI robot and a
/// room for one set of credentials.
pub fn random_six_digits() -> u32 {
    rand::thread_rng().gen_range(100_000..1_000_000)
}
