//! CLI client for the `ambientd` daemon.
//!
//! Examples:
//!   ambient-cli list
//!   ambient-cli activate snake
//!   ambient-cli duplicate fireworks
//!   ambient-cli resize snake 480 320
//!   ambient-cli speed life 2.5
//!   ambient-cli render snake
//!
//! By default it talks to 127.0.0.1:9877; override with `--addr host:port`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

use ambient::kind::WidgetKind;
use ambient::protocol::{encode_line, Request, Response, DEFAULT_ADDR};
use ambient::registry::InstanceInfo;
use ambient::render::rasterize_text;
use ambient::resolver::{ConfigPatch, SimConfig};

const RENDER_COLS: u32 = 80;
const RENDER_ROWS: u32 = 30;

fn usage() -> ! {
    eprintln!("ambient-cli (talks to ambientd @ {DEFAULT_ADDR} by default)");
    eprintln!("Usage: ambient-cli [--addr host:port] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  list                        Show running instances");
    eprintln!("  activate <kind>             Start the canonical instance of a kind");
    eprintln!("  duplicate <kind>            Start an extra instance of a kind");
    eprintln!("  deactivate <kind>           Stop the canonical instance of a kind");
    eprintln!("  remove <id>                 Remove a duplicate instance");
    eprintln!("  resize <id> <w> <h>         Report a container size in px");
    eprintln!("  speed <kind> <value>        Set speed for every instance of a kind");
    eprintln!("  render <id>                 Print the current frame as text");
    eprintln!("  start | stop                Control the frame clock");
    eprintln!("  fps <1-240>                 Set the daemon frame rate");
    eprintln!("  save                        Persist active widgets");
    eprintln!("  shutdown                    Save and exit daemon");
    eprintln!();
    eprintln!("Kinds: {}", WidgetKind::ALL.map(|k| k.key()).join(", "));
    process::exit(1);
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut addr = DEFAULT_ADDR.to_string();
    if args.len() >= 2 && args[0] == "--addr" {
        addr = args[1].clone();
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }

    (addr, args)
}

fn send_request(addr: &str, req: &Request) -> Result<Response, String> {
    let mut stream = TcpStream::connect(addr).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .map_err(|e| format!("set_read_timeout: {e}"))?;
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| format!("clone: {e}"))?);

    let line = encode_line(req).map_err(|e| format!("serialize: {e}"))?;
    stream
        .write_all(line.as_bytes())
        .map_err(|e| format!("send: {e}"))?;

    let mut resp_line = String::new();
    reader
        .read_line(&mut resp_line)
        .map_err(|e| format!("recv: {e}"))?;
    serde_json::from_str(&resp_line).map_err(|e| format!("parse response: {e}"))
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn print_instances(running: bool, frame: u64, target_fps: u32, instances: &[InstanceInfo]) {
    println!(
        "running={} frame={} fps={} instances={}",
        running,
        frame,
        target_fps,
        instances.len()
    );
    for i in instances {
        println!(
            "  {:<24} {:<18} {:>6.0}x{:<6.0} speed={:<5.2} steps={}",
            i.id, i.title, i.dimensions.width, i.dimensions.height, i.config.speed, i.steps,
        );
    }
}

/// Print a frame scaled down to fit the terminal.
fn print_frame(addr: &str, id: &str) -> Result<(), String> {
    let dims = match send_request(addr, &Request::List)? {
        Response::Instances { instances, .. } => instances
            .into_iter()
            .find(|i| i.id == id)
            .map(|i| i.dimensions)
            .ok_or_else(|| format!("no widget instance with id {id:?}"))?,
        Response::Error { message } => return Err(message),
        other => return Err(format!("unexpected response: {other:?}")),
    };
    let primitives = match send_request(addr, &Request::Render { id: id.to_string() })? {
        Response::Frame { primitives, .. } => primitives,
        Response::Error { message } => return Err(message),
        other => return Err(format!("unexpected response: {other:?}")),
    };
    let cell_w = (dims.width / RENDER_COLS as f32).max(1.0);
    let cell_h = (dims.height / RENDER_ROWS as f32).max(1.0);
    let cols = (dims.width / cell_w).ceil().max(1.0) as u32;
    let rows = (dims.height / cell_h).ceil().max(1.0) as u32;
    println!("{}", rasterize_text(&primitives, cols, rows, cell_w, cell_h));
    Ok(())
}

fn arg(args: &[String], i: usize) -> &str {
    args.get(i).map(String::as_str).unwrap_or_else(|| usage())
}

fn kind_arg(args: &[String], i: usize) -> String {
    match arg(args, i).parse::<WidgetKind>() {
        Ok(k) => k.key().to_string(),
        Err(e) => fail(&e.to_string()),
    }
}

fn number_arg(args: &[String], i: usize, what: &str) -> f32 {
    arg(args, i)
        .parse()
        .unwrap_or_else(|_| fail(&format!("{what} must be a number")))
}

fn main() {
    let (addr, args) = parse_args();
    let cmd = args[0].as_str();
    let word = |i: usize| arg(&args, i).to_string();
    let kind = |i: usize| kind_arg(&args, i);
    let number = |i: usize, what: &str| number_arg(&args, i, what);

    let req = match cmd {
        "list" | "status" => Request::List,
        "activate" => Request::Activate {
            kind: kind(1),
            config: SimConfig::default(),
        },
        "duplicate" => Request::Duplicate {
            kind: kind(1),
            config: SimConfig::default(),
        },
        "deactivate" => Request::Deactivate { kind: kind(1) },
        "remove" => Request::Remove { id: word(1) },
        "resize" => Request::Resize {
            id: word(1),
            width: number(2, "width"),
            height: number(3, "height"),
        },
        "speed" => Request::ConfigureKind {
            kind: kind(1),
            config: ConfigPatch::speed(number(2, "speed")),
        },
        "render" => {
            if let Err(e) = print_frame(&addr, &word(1)) {
                fail(&format!("Error: {e}"));
            }
            return;
        }
        "start" => Request::Start,
        "stop" => Request::Stop,
        "fps" => {
            let fps: u32 = word(1)
                .parse()
                .unwrap_or_else(|_| fail("fps must be a number (1-240)"));
            Request::SetFramerate { fps }
        }
        "save" => Request::Save,
        "shutdown" => Request::Shutdown,
        _ => usage(),
    };

    match send_request(&addr, &req) {
        Ok(Response::Success { message }) => println!("{message}"),
        Ok(Response::Created { id }) => println!("{id}"),
        Ok(Response::Instances {
            running,
            frame,
            target_fps,
            instances,
        }) => print_instances(running, frame, target_fps, &instances),
        Ok(Response::Frame { id, primitives }) => {
            println!("{id}: {} primitives", primitives.len())
        }
        Ok(Response::Error { message }) => fail(&format!("Error: {message}")),
        Err(e) => fail(&format!("Failed: {e}")),
    }
}
