/// Parses the gate config path from command-line arguments
pub fn get_config_path(default: &str) -> String {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 { args[1].clone() } else { default.to_string() }
}

/// Parses an optional positional integer argument
pub fn get_count_arg(position: usize, default: usize) -> usize {
    let args: Vec<String> = std::env::args().collect();

    args.get(position).and_then(|arg| arg.parse().ok()).unwrap_or(default)
}
