use std::{
    error::Error,
    io::{self, Write},
};

use awara::{codegen::DEFAULT_MODULE_NAME, pipeline};

fn main() {
    if let Err(error) = run() {
        println!("failed to run: {error}");
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        let n = io::stdin().read_line(&mut input)?;

        if n == 0 {
            println!("^D");
            return Ok(());
        }

        match pipeline::compile(&input, DEFAULT_MODULE_NAME) {
            Ok(module) => print!("{module}"),
            Err(error) => println!("error: {error:#}"),
        }
    }
}
