use anyhow::Result;
use taxalink_core::system::describe_paths;

pub fn run() -> Result<()> {
    println!("{}", describe_paths());
    Ok(())
}
