use std::time::Duration;

use reqwest::{Client, Error};

const DEFAULT_USER_AGENT: &str = "jamlink/0.3";

pub struct HttpClient;

impl HttpClient {
  pub fn new() -> Result<Client, Error> {
    Client::builder()
      .user_agent(DEFAULT_USER_AGENT)
      .timeout(Duration::from_secs(10))
      .build()
  }
}
