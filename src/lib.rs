//! # tiny_trtc_agent
//!
//! `tiny_trtc_agent` is a small Actix-Web backend in front of the
//! [Tencent TRTC](https://www.tencentcloud.com/products/trtc) conversational-AI API.
//! It starts and stops AI voice agents in TRTC rooms and mints the user
//! signatures a browser client needs to join them.
//!
//! ## ✅ Features
//!
//! - 🤖 `POST /conversations` starts an AI agent in a room
//! - 🛑 `DELETE /conversations` stops it again by `TaskId`
//! - 🔐 `POST /credentials` issues a user/robot pair with TLS v2 `UserSig`s
//! - 🧪 Environment file support (`.env`, `.env.production`, etc.)
//!
//! ## 🔧 Configuration
//!
//! Start the app like this:
//!
//! ```bash
//! cargo run -- .env.production
//! ```
//!
//! ### Required `.env` values
//!
//! - `TRTC_SDK_APP_ID`
//! - `TRTC_SECRET_KEY`
//! - `TENCENT_SECRET_ID`
//! - `TENCENT_SECRET_KEY`
//!
//! ### Optional
//!
//! - `TENCENT_REGION=ap-beijing`, `TENCENT_ENDPOINT=trtc.tencentcloudapi.com`
//! - `LLM_MODEL`, `LLM_API_URL`, `LLM_API_KEY`
//! - `TTS_TYPE=new`, `TTS_API_KEY`, `TTS_API_URL`, `TTS_SAMPLE_RATE=24000`, `TTS_VOICE_ID`
//! - `USER_SIG_EXPIRY=36000`
//! - `HOST=127.0.0.1`, `PORT=3000`, `STATIC_DIR=static`
//! - `RUST_LOG=info`
//!
//! ## 📚 Modules
//!
//! - [`trtc`](crate::trtc) — signatures and the TRTC API client
//! - [`handlers`](crate::handlers) — HTTP endpoints
//! - [`config`](crate::config) — environment configuration
//! - [`error`](crate::error) — JSON error responses
//! - [`utils`](crate::utils) — environment loader
//!
//! ## 📄 License
//!
//! MIT License

pub mod config;
pub mod error;
pub mod handlers;
pub mod trtc;
pub mod utils;
