fn main() -> color_eyre::Result<()> {
    error_normalizer::run()
}
