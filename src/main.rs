fn main() {
    script_compiler::cli::start_cli();
}
