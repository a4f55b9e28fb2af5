use yalgen::error::Error;

fn main() {
    if let Err(error) = yalgen::run() {
        eprintln!("{error:#}");
        let code = error
            .downcast_ref::<Error>()
            .map(Error::exit_code)
            .unwrap_or(4);
        std::process::exit(code);
    }
}
