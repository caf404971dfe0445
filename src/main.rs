fn main() {
    std::process::exit(rfp_report::cli::run());
}
