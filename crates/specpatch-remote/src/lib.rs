mod http;

pub mod auth;
pub mod credentials;
pub mod lock;
pub mod upstream;

pub use auth::HttpAuth;
pub use credentials::{
    CredentialSource, EnvCredentials, EnvOrPrompt, PromptCredentials, StaticCredentials,
};
pub use lock::HttpLock;
pub use upstream::HttpUpstream;
