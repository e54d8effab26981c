//! Model backend access

mod gateway;
mod http_client;
mod openai;

pub use gateway::{CONTENT_CONTEXT_MARKER, FALLBACK_EMBEDDING_DIMENSIONS, ModelGateway};
pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use openai::OpenAiProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
