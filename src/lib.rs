pub mod auth;
pub mod cli {
    pub mod parser;
}
pub mod config;
pub mod error;
pub mod github {
    pub mod body;
    pub mod client;
    pub mod issues;
    pub mod labels;
    pub mod replace;
    pub mod upload;
}
pub mod output;
pub mod run;
pub mod server;
pub mod whoami;
