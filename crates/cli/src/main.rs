fn main() -> anyhow::Result<()> {
    usagescope_cli::run()
}
