//! Tencent TRTC integration: user signatures, API request signing and the
//! conversational-AI client.

pub mod client;
pub mod tc3;
pub mod usersig;

pub use client::{ConversationApi, RemoteError, StartAiConversationParams, TrtcClient};
pub use usersig::{SigningError, UserSigGenerator};
