use std::io::Read;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input-file | ->", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let src = read_source(filename).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", filename, e);
        std::process::exit(1);
    });

    match pywat::compile(&src) {
        Ok(wat) => print!("{}", wat),
        Err(err) => {
            eprintln!("{}", err.display(&src));
            std::process::exit(1);
        }
    }
}

fn read_source(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut src = String::new();
        std::io::stdin().read_to_string(&mut src)?;
        Ok(src)
    } else {
        std::fs::read_to_string(path)
    }
}
