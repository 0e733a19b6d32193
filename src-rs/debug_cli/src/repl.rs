use std::io;

use crate::client::HTTPClient;
use crate::models::{CLIConfig, ChatMessage, ClaimRequest, TweetRequest};
use crate::render;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Help,
    Image(&'a str),
    Tweet(&'a str),
    History,
    Reset,
    Config,
    Base(&'a str),
    Debug(&'a str),
    Health,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let mut parts = line.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("").trim_start_matches('/');
    let rest = parts.next().unwrap_or("").trim();
    match cmd {
        "exit" | "quit" => Command::Exit,
        "help" => Command::Help,
        "image" => Command::Image(rest),
        "tweet" => Command::Tweet(rest),
        "history" => Command::History,
        "reset" => Command::Reset,
        "config" => Command::Config,
        "base" => Command::Base(rest),
        "debug" => Command::Debug(rest),
        "health" => Command::Health,
        other => Command::Unknown(other),
    }
}

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
    pub history: Vec<ChatMessage>,
    last_claim: Option<String>,
    last_verdict: Option<String>,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self {
            config,
            client,
            history: Vec::new(),
            last_claim: None,
            last_verdict: None,
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt(self.config.pending_image.is_some());
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.check(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Command::Exit => return true,
            Command::Help => render::help(),
            Command::Image(url) => {
                if url.is_empty() {
                    self.config.pending_image = None;
                    render::info("image cleared");
                } else {
                    self.config.pending_image = Some(url.to_string());
                    render::info("image attached to the next claim (send an empty claim with `.` to check the image alone)");
                }
            }
            Command::Tweet(original) => self.tweet(original),
            Command::History => render::history(&self.history),
            Command::Reset => {
                self.history.clear();
                self.last_claim = None;
                self.last_verdict = None;
                render::info("history cleared");
            }
            Command::Config => render::config(&self.config),
            Command::Base(url) => {
                if url.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    match HTTPClient::new(url, self.config.timeout_secs) {
                        Ok(client) => {
                            self.config.base_url = url.to_string();
                            self.client = client;
                            render::info("base url updated");
                        }
                        Err(err) => render::error(&err),
                    }
                }
            }
            Command::Debug(flag) => match parse_on_off(flag) {
                Some(value) => {
                    self.config.debug = value;
                    render::info(&format!("debug: {}", value));
                }
                None if flag.is_empty() => {
                    self.config.debug = !self.config.debug;
                    render::info(&format!("debug: {}", self.config.debug));
                }
                None => render::error("invalid debug flag"),
            },
            Command::Health => match self.client.health() {
                Ok(value) => render::info(&value.to_string()),
                Err(err) => render::error(&err),
            },
            Command::Unknown(_) => render::info("unknown command, type /help"),
        }
        false
    }

    fn check(&mut self, line: &str) {
        let input = if line == "." { String::new() } else { line.to_string() };
        let req = ClaimRequest {
            input: input.clone(),
            image: self.config.pending_image.take(),
        };
        self.history.push(ChatMessage {
            role: "claim".to_string(),
            content: match &req.image {
                Some(image) => format!("{} [image: {}]", input, image),
                None => input.clone(),
            },
        });

        match self.client.check(&req) {
            Ok(resp) => {
                if let Some(output) = &resp.output {
                    self.history.push(ChatMessage {
                        role: "verdict".to_string(),
                        content: output.clone(),
                    });
                    self.last_claim = Some(input);
                    self.last_verdict = Some(output.clone());
                }
                render::verdict(&resp, self.config.debug);
            }
            Err(err) => render::error(&err),
        }
    }

    fn tweet(&mut self, original: &str) {
        let fact_check = match &self.last_verdict {
            Some(verdict) => verdict.clone(),
            None => {
                render::error("no verdict yet, check a claim first");
                return;
            }
        };
        let original_tweet = if original.is_empty() {
            self.last_claim.clone().unwrap_or_default()
        } else {
            original.to_string()
        };
        let req = TweetRequest {
            fact_check,
            original_tweet,
        };
        match self.client.tweet(&req) {
            Ok(resp) => {
                if let Some(tweet) = &resp.tweet {
                    self.history.push(ChatMessage {
                        role: "tweet".to_string(),
                        content: tweet.clone(),
                    });
                }
                render::tweet(&resp);
            }
            Err(err) => render::error(&err),
        }
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("/image https://img.test/a.png"), Command::Image("https://img.test/a.png"));
        assert_eq!(parse_command("/tweet  X is Z "), Command::Tweet("X is Z"));
        assert_eq!(parse_command("/quit"), Command::Exit);
        assert_eq!(parse_command("/image"), Command::Image(""));
        assert_eq!(parse_command("/tasks"), Command::Unknown("tasks"));
    }

    #[test]
    fn on_off_flags() {
        assert_eq!(parse_on_off("ON"), Some(true));
        assert_eq!(parse_on_off("no"), Some(false));
        assert_eq!(parse_on_off("maybe"), None);
    }
}
