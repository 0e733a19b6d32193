use std::io::{self, Write};

use crate::models::{CLIConfig, ChatMessage, FactCheckResponse, TweetResponse};

pub fn banner(cfg: &CLIConfig) {
    println!("Fact Check Debug CLI");
    println!("API: {}", cfg.base_url);
    println!("Type a claim to check it, or /help for commands.");
}

pub fn prompt(image_attached: bool) {
    if image_attached {
        print!("claim [+image]> ");
    } else {
        print!("claim> ");
    }
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                 Show commands");
    println!("  /exit | /quit         Exit");
    println!("  /image [url]          Attach an image to the next claim (no url clears it)");
    println!("  /tweet [original]     Draft a reply tweet from the last verdict");
    println!("  /health               Query the service health endpoint");
    println!("  /debug [on|off]       Toggle raw response output");
    println!("  /history              Show session history");
    println!("  /reset                Clear session history");
    println!("  /config               Show current config");
    println!("  /base <url>           Update base URL");
}

pub fn verdict(resp: &FactCheckResponse, debug: bool) {
    if debug {
        println!("raw: {:?}", resp);
    }
    match (&resp.output, &resp.error) {
        (Some(output), _) => println!("verdict> {}", output),
        (None, Some(err)) => match &resp.kind {
            Some(kind) => println!("error ({}): {}", kind, err),
            None => println!("error: {}", err),
        },
        (None, None) => println!("error: empty response"),
    }
}

pub fn tweet(resp: &TweetResponse) {
    match (&resp.tweet, &resp.error) {
        (Some(tweet), _) => println!("tweet> {}", tweet),
        (None, Some(err)) => println!("error: {}", err),
        (None, None) => println!("error: empty response"),
    }
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  timeout: {}s", cfg.timeout_secs);
    println!("  debug: {}", cfg.debug);
    if let Some(image) = &cfg.pending_image {
        println!("  pending image: {}", image);
    }
}

pub fn history(items: &[ChatMessage]) {
    if items.is_empty() {
        println!("no history");
        return;
    }
    for msg in items {
        println!("{}> {}", msg.role, msg.content);
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
