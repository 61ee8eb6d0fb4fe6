//! VesselHarbor configuration: default schema, source bindings and the
//! schema extensions contributed by command modules.

use crate::config::{Bindings, Schema, SchemaNode, Settings, SourceBinding};
use crate::error::ConfigResult;

/// Software name; prefixes environment variables and names directories.
pub const SOFTWARE: &str = "VesselHarbor";

/// Default file name for `--write`.
pub const LOCAL_CONFIG_FILE: &str = "vesselharbor.toml";

/// Name of the configuration file inside each configuration directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Built-in schema shared by every command.
pub fn default_schema() -> Schema {
    Schema::new([
        (
            "application",
            SchemaNode::section([
                ("verbose", SchemaNode::leaf(false)),
                ("ip_address", SchemaNode::leaf("127.0.0.1")),
                ("port", SchemaNode::leaf(8010)),
                ("socket", SchemaNode::leaf("")),
                ("user", SchemaNode::leaf("example@example.com")),
                ("password", SchemaNode::leaf("changeme")),
                ("api_key", SchemaNode::leaf("changeme")),
            ]),
        ),
        (
            "internal",
            SchemaNode::section([
                ("development", SchemaNode::leaf(false)),
                ("debug", SchemaNode::leaf(false)),
                ("simulate", SchemaNode::leaf(false)),
                ("noauth", SchemaNode::leaf(false)),
                ("demo", SchemaNode::leaf(false)),
            ]),
        ),
    ])
}

fn bound(cli: &str, env: &str, dotenv: &str) -> SourceBinding {
    SourceBinding::new()
        .cli(cli)
        .env(format!("{}_{}", SOFTWARE.to_uppercase(), env))
        .dotenv(dotenv)
}

/// Bindings for the built-in schema. Keys reachable from the command line
/// carry their flag; every other leaf gets the conventional names.
pub fn default_bindings(schema: &Schema) -> Bindings {
    let mut bindings = Bindings::new()
        .with("internal.debug", bound("debug_do_not_use", "DEBUG", "DEBUG"))
        .with(
            "internal.simulate",
            bound("simulate_do_not_use", "SIMULATE", "SIMULATE"),
        )
        .with(
            "internal.development",
            bound("development_do_not_use", "DEVEL", "DEVELOPMENT"),
        )
        .with("internal.noauth", bound("noauth_do_not_use", "NOAUTH", "NOAUTH"))
        .with("internal.demo", bound("demo", "DEMO", "DEMO"))
        .with("application.verbose", bound("verbose", "VERBOSE", "VERBOSE"))
        .with(
            "application.ip_address",
            bound("ip_address[0]", "IP_ADDRESS", "IP_ADDRESS"),
        )
        .with("application.port", bound("port[0]", "PORT", "PORT"))
        .with("application.socket", bound("socket[0]", "SOCKET", "SOCKET"));
    bindings.extend(Bindings::conventional(schema, SOFTWARE));
    bindings
}

/// A command group that needs configuration keys of its own.
pub trait ConfigModule {
    /// Command group name, as used on the command line.
    fn name(&self) -> &'static str;

    /// Schema fragment merged into the built-in schema.
    fn schema(&self) -> Option<Schema> {
        None
    }

    /// Extra bindings. Keys already bound by the built-in table keep theirs.
    fn bindings(&self, _schema: &Schema) -> Bindings {
        Bindings::new()
    }
}

/// Authentication commands: named accounts to sign in with.
pub struct AuthModule;

impl ConfigModule for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn schema(&self) -> Option<Schema> {
        Some(Schema::new([(
            "accounts",
            SchemaNode::template(SchemaNode::section([
                ("user", SchemaNode::leaf("")),
                ("password", SchemaNode::leaf("")),
                ("api_key", SchemaNode::leaf("")),
                ("token", SchemaNode::leaf("")),
            ])),
        )]))
    }
}

/// Command modules shipped with the binary.
pub fn modules() -> Vec<Box<dyn ConfigModule>> {
    vec![Box::new(AuthModule)]
}

/// Built-in schema and bindings extended by every module in `modules`.
pub fn build(modules: &[Box<dyn ConfigModule>]) -> (Schema, Bindings) {
    let mut schema = default_schema();
    for module in modules {
        if let Some(fragment) = module.schema() {
            tracing::debug!(module = module.name(), "Extending configuration schema");
            schema.extend(fragment);
        }
    }
    let mut bindings = default_bindings(&schema);
    for module in modules {
        bindings.extend(module.bindings(&schema));
    }
    (schema, bindings)
}

/// Base URL of the VesselHarbor API, derived from the current bind settings
/// on every call.
pub fn base_url(settings: &Settings) -> ConfigResult<String> {
    let socket: String = settings.get_as("application.socket")?;
    if !socket.is_empty() {
        return Ok(format!("http://unix:{socket}"));
    }
    let address: String = settings.get_as("application.ip_address")?;
    let port: u16 = settings.get_as("application.port")?;
    Ok(format!("http://{address}:{port}"))
}
