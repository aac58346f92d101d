use clap::Shell;
use std::{env, path::PathBuf};

#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let mut cli = cli::generate_cli();
    let mut out_dir = match env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => return,
    };
    out_dir.pop();
    out_dir.pop();
    out_dir.pop();

    cli.gen_completions("apk-guardian", Shell::Bash, &out_dir);
    cli.gen_completions("apk-guardian", Shell::Fish, &out_dir);
    cli.gen_completions("apk-guardian", Shell::Zsh, out_dir);
}
