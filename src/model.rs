//! Typed project model as it comes out of the schema loader.
//!
//! Everything here is read-only for the rest of the run: the planner and
//! composer borrow the `Project`, the driver owns it.

use serde::Deserialize;

/// Top-level unit of generation.
#[derive(Debug, Deserialize)]
pub struct Project {
    pub project_name: String,
    pub project_long_name: String,
    /// Starts with `lib`; the remainder is `library_name_suffix`.
    pub library_name: String,
    pub python_module_name: String,
    pub tools_name: String,
    pub authors: String,
    /// Year range stamped into generated files, e.g. `2009-2024`.
    pub copyright: String,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub structures: Vec<Structure>,
    #[serde(default)]
    pub types: Vec<HandleType>,
    #[serde(default)]
    pub codepages: Vec<CodepageTable>,
    #[serde(default)]
    pub mount_tool: Option<MountToolProfile>,
    #[serde(default)]
    pub info_tool: Option<InfoToolProfile>,
}

impl Project {
    /// `libbde` -> `bde`. The loader guarantees the `lib` prefix.
    pub fn library_name_suffix(&self) -> &str {
        self.library_name
            .strip_prefix("lib")
            .unwrap_or(&self.library_name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub has_wide_character_type: bool,
    #[serde(default)]
    pub has_debug_output: bool,
    #[serde(default)]
    pub has_bfio: bool,
    #[serde(default)]
    pub has_multi_thread_support: bool,
}

/// One binary record layout. Exactly one structure per output file.
#[derive(Debug, Deserialize)]
pub struct Structure {
    pub name: String,
    pub description: String,
    /// C struct tag prefix; defaults to the library name.
    #[serde(default)]
    pub prefix: Option<String>,
    pub members: Vec<StructureMember>,
}

impl Structure {
    /// Declared on-wire size in bytes.
    pub fn wire_size(&self) -> u32 {
        self.members.iter().map(|m| m.width()).sum()
    }
}

#[derive(Debug, Deserialize)]
pub struct StructureMember {
    pub name: String,
    pub description: String,
    pub kind: MemberKind,
    /// Required for kinds without an implied width.
    #[serde(default)]
    pub width_bytes: Option<u32>,
    /// Literal value for signature members.
    #[serde(default)]
    pub value: Option<SignatureValue>,
    /// Cosmetic tab alignment for debug output.
    #[serde(default)]
    pub debug_tab: Option<u8>,
}

impl StructureMember {
    /// Byte width on the wire, taking the kind's implied width when the
    /// schema does not spell one out.
    pub fn width(&self) -> u32 {
        match self.kind.implied_width() {
            Some(width) => width,
            None => self.width_bytes.unwrap_or(0),
        }
    }
}

/// Interpretation of one structure member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Bytes,
    LeUint16,
    LeUint32,
    LeUint64,
    Guid,
    Filetime,
    FatDatetime,
    PosixTime32,
    PosixTime64,
    SignatureStream,
    SignatureInteger,
    /// Length-prefixed string.
    String,
}

impl MemberKind {
    /// Width fixed by the interpretation, or `None` when the schema must
    /// provide `width_bytes`.
    pub fn implied_width(self) -> Option<u32> {
        match self {
            MemberKind::LeUint16 => Some(2),
            MemberKind::LeUint32 => Some(4),
            MemberKind::LeUint64 => Some(8),
            MemberKind::Guid => Some(16),
            MemberKind::Filetime => Some(8),
            MemberKind::FatDatetime => Some(4),
            MemberKind::PosixTime32 => Some(4),
            MemberKind::PosixTime64 => Some(8),
            MemberKind::Bytes
            | MemberKind::SignatureStream
            | MemberKind::SignatureInteger
            | MemberKind::String => None,
        }
    }
}

/// Literal expected at a signature member position.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignatureValue {
    Integer(u64),
    Stream(String),
}

/// An opaque handle surfaced in the generated public API.
#[derive(Debug, Deserialize)]
pub struct HandleType {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub init_shape: InitShape,
    /// Whether the type supports open/close with a file IO handle.
    #[serde(default)]
    pub has_open: bool,
    #[serde(default)]
    pub values: Vec<TypeValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitShape {
    #[default]
    Plain,
    WithParent,
    WithInput,
}

/// One accessor surfaced by a handle type.
#[derive(Debug, Deserialize)]
pub struct TypeValue {
    pub name: String,
    pub description: String,
    pub kind: ValueKind,
    /// Retrieval may report absence (result 0) instead of failing.
    #[serde(default)]
    pub is_set: bool,
    #[serde(default)]
    pub has_value: bool,
    /// Also generate the matching mutator.
    #[serde(default)]
    pub is_settable: bool,
    /// For object references: how children are addressed.
    #[serde(default)]
    pub lookup: Option<ObjectLookup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int64,
    Boolean,
    Filetime,
    FatDatetime,
    PosixTime,
    Guid,
    Binary,
    String,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectLookup {
    ByName,
    ByPath,
}

/// A declared 8-bit to Unicode mapping plus its test data.
#[derive(Debug, Deserialize)]
pub struct CodepageTable {
    pub name: String,
    pub description: String,
    pub mapping: Vec<CodepageMapping>,
    #[serde(default)]
    pub test_mappings: Vec<CodepageMapping>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CodepageMapping {
    pub byte: u8,
    pub codepoint: u32,
}

#[derive(Debug, Deserialize)]
pub struct MountToolProfile {
    pub source_type: MountSourceType,
    pub file_entry_type: String,
    #[serde(default)]
    pub file_system_type: Option<String>,
    #[serde(default)]
    pub access_time_member: Option<String>,
    #[serde(default)]
    pub creation_time_member: Option<String>,
    #[serde(default)]
    pub modification_time_member: Option<String>,
    #[serde(default)]
    pub inode_change_time_member: Option<String>,
    /// Path prefix synthesized for unnamed children, e.g. `/item`.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Whether the tool opens a glob of segment files instead of one file.
    #[serde(default)]
    pub has_glob: bool,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

fn default_path_prefix() -> String {
    "/item".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountSourceType {
    File,
    Volume,
    Handle,
    Container,
}

impl MountSourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            MountSourceType::File => "file",
            MountSourceType::Volume => "volume",
            MountSourceType::Handle => "handle",
            MountSourceType::Container => "container",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Password,
    RecoveryPassword,
    Keys,
    StartupKey,
    EncryptedRootPlist,
    FileSystemIndex,
}

impl Credential {
    /// Short option letter in the generated mount tool's getopt string.
    pub fn letter(self) -> char {
        match self {
            Credential::Password => 'p',
            Credential::RecoveryPassword => 'r',
            Credential::Keys => 'k',
            Credential::StartupKey => 's',
            Credential::EncryptedRootPlist => 'e',
            Credential::FileSystemIndex => 'f',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Credential::Password => "password",
            Credential::RecoveryPassword => "recovery_password",
            Credential::Keys => "keys",
            Credential::StartupKey => "startup_key",
            Credential::EncryptedRootPlist => "encrypted_root_plist",
            Credential::FileSystemIndex => "file_system_index",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InfoToolProfile {
    pub source_type: String,
    pub options: Vec<InfoToolOption>,
}

#[derive(Debug, Deserialize)]
pub struct InfoToolOption {
    pub letter: char,
    pub name: String,
    pub help: String,
}
