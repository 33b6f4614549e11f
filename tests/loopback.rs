//! End-to-end test over real loopback TCP.

use pollshell::{Args, Config, Connection, Handler, Server, TcpChannel};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Login {
    ok: bool,
}

#[derive(Default)]
struct Shell {
    commands: Vec<Vec<String>>,
    disconnects: Vec<String>,
}

impl Handler<TcpChannel> for Shell {
    type Data = Login;

    fn on_connect(&mut self, conn: &mut Connection<Login, TcpChannel>) {
        conn.write(b"welcome\n", false).unwrap();
    }

    fn on_command(&mut self, conn: &mut Connection<Login, TcpChannel>, args: &Args<'_>) {
        self.commands.push(
            args.iter()
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect(),
        );
        match args.command() {
            b"login" if args.str(1) == Some("123456") => {
                conn.data.ok = true;
                conn.write(b"login success\n", false).unwrap();
            }
            b"echo" if conn.data.ok => {
                conn.write(args.get(1).unwrap_or_default(), true).unwrap();
                conn.write(b"\n", false).unwrap();
            }
            _ => conn.write(b"denied\n", false).unwrap(),
        }
    }

    fn on_disconnect(&mut self, _conn: &mut Connection<Login, TcpChannel>, reason: &str) {
        self.disconnects.push(reason.to_string());
    }
}

fn bind(idle_timeout_ms: u64) -> Server<Login> {
    let config = Config {
        listen: "127.0.0.1:0".to_string(),
        idle_timeout_ms,
        ..Config::default()
    };
    Server::bind(&config).unwrap()
}

/// Poll until `done` holds or five seconds pass.
fn poll_until(
    server: &mut Server<Login>,
    shell: &mut Shell,
    mut done: impl FnMut(&Server<Login>, &Shell) -> bool,
) {
    let start = Instant::now();
    while !done(server, shell) {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out polling");
        server.poll(shell);
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn read_exact_str(client: &mut TcpStream, len: usize) -> String {
    let mut buf = vec![0u8; len];
    client.read_exact(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_login_and_echo_over_tcp() {
    let mut server = bind(0);
    let mut shell = Shell::default();
    let addr = server.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    poll_until(&mut server, &mut shell, |server, _| server.len() == 1);
    assert_eq!(read_exact_str(&mut client, 8), "welcome\n");

    // Split across writes to exercise partial reads.
    client.write_all(b"login 1234").unwrap();
    client.flush().unwrap();
    server.poll(&mut shell);
    client.write_all(b"56\r\necho \"hello world\"\n").unwrap();
    poll_until(&mut server, &mut shell, |_, shell| shell.commands.len() == 2);

    assert_eq!(read_exact_str(&mut client, 14), "login success\n");
    assert_eq!(read_exact_str(&mut client, 12), "hello world\n");
    assert_eq!(shell.commands[0], vec!["login", "123456"]);
    assert_eq!(shell.commands[1], vec!["echo", "hello world"]);

    drop(client);
    poll_until(&mut server, &mut shell, |server, _| server.is_empty());
    assert_eq!(shell.disconnects.len(), 1);
}

#[test]
fn test_idle_connection_times_out() {
    let mut server = bind(50);
    let mut shell = Shell::default();
    let addr = server.local_addr().unwrap();

    let _client = TcpStream::connect(addr).unwrap();
    poll_until(&mut server, &mut shell, |server, _| server.len() == 1);
    poll_until(&mut server, &mut shell, |server, _| server.is_empty());
    assert_eq!(shell.disconnects, vec!["timeout".to_string()]);
}

#[test]
fn test_bind_invalid_address() {
    let config = Config {
        listen: "not an address".to_string(),
        ..Config::default()
    };
    let result: Result<Server<Login>, _> = Server::bind(&config);
    match result {
        Err(pollshell::ServerError::InvalidAddress { addr, .. }) => {
            assert_eq!(addr, "not an address")
        }
        other => panic!("unexpected: {:?}", other.err()),
    }
}
