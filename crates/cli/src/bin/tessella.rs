use anyhow::Result;

fn main() -> Result<()> {
    tessella_cli::main_entry()
}
