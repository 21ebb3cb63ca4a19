use clap::Parser;
use http::Request;
use http_request_extraction::{self as hrx, request_shape, Decoder, ExtensionPathParams, PathParams, Record};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Decode a hand-built request into a demo record and print it as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Request target, e.g. "/echo?name.first=John&name.last=Doe"
    #[arg(default_value = "/")]
    uri: String,
    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    method: String,
    /// Header as "Name: value" (repeatable)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,
    /// Request body
    #[arg(long)]
    body: Option<String>,
    /// Path variable as "name=value" (repeatable)
    #[arg(long = "path")]
    path_params: Vec<String>,
    /// Print the demo record's field sources and exit
    #[arg(long)]
    describe: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct FullName {
    first: String,
    last: String,
    middle: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct EchoRequest {
    name: FullName,
    id: Option<u64>,
    user_agent: String,
    session: Option<String>,
    verbose: bool,
    message: String,
}

request_shape! {
    FullName {
        first => query("first"),
        last => query("last"),
        middle => query("middle"),
    }
}

request_shape! {
    EchoRequest {
        name => query("name"),
        id => path("id"),
        user_agent => header("User-Agent"),
        session => cookie("session"),
        verbose => query("verbose"),
    }
}

fn describe<T: Record>() -> String {
    let shape = T::shape();
    let fields = shape
        .resolved_fields()
        .map(|(ident, source, name)| format!("  {ident:<12} {source:<7} {name}"))
        .join("\n");
    format!("{}\n{fields}", shape.type_name)
}

fn build_request(args: &Args) -> Result<Request<Vec<u8>>, String> {
    let mut builder = Request::builder().method(args.method.as_str()).uri(args.uri.as_str());
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header must look like \"Name: value\": {header}"))?;
        builder = builder.header(name.trim(), value.trim());
    }
    let params: PathParams = args
        .path_params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .ok_or_else(|| format!("path variable must look like \"name=value\": {param}"))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .collect();
    builder
        .extension(params)
        .body(args.body.clone().unwrap_or_default().into_bytes())
        .map_err(|e| format!("invalid request: {e}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();
    init_tracing();

    if args.describe {
        println!("{}", describe::<EchoRequest>());
        println!("{}", describe::<FullName>());
        return;
    }

    let request = match build_request(&args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    // Path variables come from the request extensions filled above.
    if hrx::install(Decoder::builder().path_lookup(ExtensionPathParams).build()).is_err() {
        tracing::warn!("decoder already installed");
    }

    let mut out = EchoRequest::default();
    if let Err(e) = hrx::unmarshal(&request, &mut out) {
        eprintln!("Decode failed: {e}");
        std::process::exit(1);
    }

    match serde_json::to_string_pretty(&out) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to render result: {e}");
            std::process::exit(1);
        }
    }
}
