use std::error::Error;
use std::fs::File;

use brammap_memory::Rules;

fn run() -> Result<(), Box<dyn Error>> {
    let mut rules_path = String::new();
    let mut input = String::new();
    let mut output = String::new();
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Convert multi-port $mem memory cells into block ram instances.");
        parser
            .refer(&mut rules_path)
            .add_option(&["-r", "--rules"], argparse::Store, "Rules file describing the available bram resources")
            .required();
        parser.refer(&mut input).add_argument("INPUT", argparse::Store, "Input design (Yosys JSON)").required();
        parser.refer(&mut output).add_argument("OUTPUT", argparse::Store, "Output design (Yosys JSON)");
        parser.parse_args_or_exit();
    }

    let rules = Rules::from_file(&rules_path).map_err(|error| format!("{}: {}", rules_path, error))?;
    let mut design = brammap_yosys_json::import(&mut File::open(&input)?)?;
    brammap_memory::memory_bram(&mut design, &rules)?;
    if output.is_empty() {
        brammap_yosys_json::export(&mut std::io::stdout(), &design)?;
    } else {
        brammap_yosys_json::export(&mut File::create(&output)?, &design)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}
