mod entry;
mod logger;

use tlsload::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
