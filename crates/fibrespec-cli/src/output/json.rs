use fibrespec_core::error::FibreSpecError;
use fibrespec_core::model::SpecificationOutput;

pub fn print(outputs: &[&SpecificationOutput]) -> Result<(), FibreSpecError> {
    let json = serde_json::to_string_pretty(outputs)?;
    println!("{json}");
    Ok(())
}
