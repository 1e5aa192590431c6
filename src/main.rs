use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);
    codechord::repl::start(initial_file)
}
