//! Minimal reader for the JVM class-file format.
//!
//! Only the parts needed to discover goal declarations are decoded:
//! - class name, super class and access flags
//! - fields and methods with their descriptors and generic signatures
//! - runtime visible and invisible annotations, including nested values

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};
use std::path::Path;

use crate::error::{Error, Result};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;

const MAGIC: u32 = 0xCAFE_BABE;

/// The JVM rejects array types with more dimensions than this
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Deepest nesting of annotation values or generic type arguments accepted
const MAX_NESTING: usize = 64;

/// Decoded view of one class file
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub access_flags: u16,
    /// Binary name with dots, e.g. `org.example.FooMojo`
    pub name: String,
    pub super_name: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl MemberInfo {
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.type_name == type_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Qualified annotation type, e.g. `org.apache.maven.plugins.annotations.Mojo`
    pub type_name: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            ElementValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ElementValue::Boolean(value) => Some(*value),
            ElementValue::Int(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Constant name of an enum-valued element
    pub fn enum_constant(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            ElementValue::Enum { constant, .. } => Some(constant.clone()),
            _ => None,
        }
    }

    pub fn class(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            ElementValue::Class(type_name) => Some(type_name.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Boolean(bool),
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
    Enum { type_name: String, constant: String },
    /// Qualified class name (or primitive name) of a class literal
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone)]
enum PoolEntry {
    Empty,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    Other,
}

impl ClassFile {
    /// Decode `bytes`; `path` only names the file in errors
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        ClassReader::new(bytes)
            .read()
            .map_err(|e| Error::class_format(path, e.to_string()))
    }
}

struct ClassReader<'a> {
    cursor: Cursor<&'a [u8]>,
    pool: Vec<PoolEntry>,
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

impl<'a> ClassReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            pool: Vec::new(),
        }
    }

    fn read(mut self) -> io::Result<ClassFile> {
        let magic = self.cursor.read_u32::<BigEndian>()?;
        if magic != MAGIC {
            return Err(invalid(format!("bad magic number {magic:#010x}")));
        }
        let _minor = self.cursor.read_u16::<BigEndian>()?;
        let _major = self.cursor.read_u16::<BigEndian>()?;
        self.read_constant_pool()?;

        let access_flags = self.cursor.read_u16::<BigEndian>()?;
        let this_index = self.cursor.read_u16::<BigEndian>()?;
        let name = self.class_name(this_index)?;
        let super_index = self.cursor.read_u16::<BigEndian>()?;
        let super_name = match super_index {
            0 => None,
            index => Some(self.class_name(index)?),
        };

        let interfaces = self.cursor.read_u16::<BigEndian>()?;
        for _ in 0..interfaces {
            self.cursor.read_u16::<BigEndian>()?;
        }

        let fields = self.read_members()?;
        let methods = self.read_members()?;
        let (annotations, _) = self.read_attributes()?;

        Ok(ClassFile {
            access_flags,
            name,
            super_name,
            annotations,
            fields,
            methods,
        })
    }

    fn read_constant_pool(&mut self) -> io::Result<()> {
        let count = self.cursor.read_u16::<BigEndian>()? as usize;
        self.pool = Vec::with_capacity(count);
        self.pool.push(PoolEntry::Empty);

        while self.pool.len() < count {
            let tag = self.cursor.read_u8()?;
            let entry = match tag {
                1 => {
                    let length = self.cursor.read_u16::<BigEndian>()? as usize;
                    let mut buffer = vec![0u8; length];
                    self.cursor.read_exact(&mut buffer)?;
                    PoolEntry::Utf8(String::from_utf8_lossy(&buffer).into_owned())
                }
                3 => PoolEntry::Integer(self.cursor.read_i32::<BigEndian>()?),
                4 => PoolEntry::Float(self.cursor.read_f32::<BigEndian>()?),
                5 => PoolEntry::Long(self.cursor.read_i64::<BigEndian>()?),
                6 => PoolEntry::Double(self.cursor.read_f64::<BigEndian>()?),
                7 => PoolEntry::Class(self.cursor.read_u16::<BigEndian>()?),
                8 | 16 | 19 | 20 => {
                    self.cursor.read_u16::<BigEndian>()?;
                    PoolEntry::Other
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    self.cursor.read_u32::<BigEndian>()?;
                    PoolEntry::Other
                }
                15 => {
                    self.cursor.read_u8()?;
                    self.cursor.read_u16::<BigEndian>()?;
                    PoolEntry::Other
                }
                other => return Err(invalid(format!("unknown constant pool tag {other}"))),
            };

            // 8-byte constants occupy two slots
            let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            self.pool.push(entry);
            if wide {
                self.pool.push(PoolEntry::Empty);
            }
        }
        Ok(())
    }

    fn entry(&self, index: u16) -> io::Result<&PoolEntry> {
        self.pool
            .get(index as usize)
            .ok_or_else(|| invalid(format!("constant pool index {index} out of range")))
    }

    fn utf8(&self, index: u16) -> io::Result<String> {
        match self.entry(index)? {
            PoolEntry::Utf8(value) => Ok(value.clone()),
            _ => Err(invalid(format!("constant {index} is not a UTF8 entry"))),
        }
    }

    fn read_utf8(&mut self) -> io::Result<String> {
        let index = self.cursor.read_u16::<BigEndian>()?;
        self.utf8(index)
    }

    fn class_name(&self, index: u16) -> io::Result<String> {
        match self.entry(index)? {
            PoolEntry::Class(name_index) => Ok(self.utf8(*name_index)?.replace('/', ".")),
            _ => Err(invalid(format!("constant {index} is not a class entry"))),
        }
    }

    fn read_members(&mut self) -> io::Result<Vec<MemberInfo>> {
        let count = self.cursor.read_u16::<BigEndian>()?;
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let access_flags = self.cursor.read_u16::<BigEndian>()?;
            let name = self.read_utf8()?;
            let descriptor = self.read_utf8()?;
            let (annotations, signature) = self.read_attributes()?;
            members.push(MemberInfo {
                access_flags,
                name,
                descriptor,
                signature,
                annotations,
            });
        }
        Ok(members)
    }

    /// Returns the annotations and generic signature; other attributes are skipped
    fn read_attributes(&mut self) -> io::Result<(Vec<Annotation>, Option<String>)> {
        let count = self.cursor.read_u16::<BigEndian>()?;
        let mut annotations = Vec::new();
        let mut signature = None;

        for _ in 0..count {
            let name = self.read_utf8()?;
            let length = self.cursor.read_u32::<BigEndian>()? as u64;
            let end = self.cursor.position() + length;
            if end > self.cursor.get_ref().len() as u64 {
                return Err(invalid(format!("attribute {name} overruns the file")));
            }

            match name.as_str() {
                "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                    let entries = self.cursor.read_u16::<BigEndian>()?;
                    for _ in 0..entries {
                        annotations.push(self.read_annotation(0)?);
                    }
                }
                "Signature" => {
                    signature = Some(self.read_utf8()?);
                }
                _ => {}
            }
            self.cursor.set_position(end);
        }
        Ok((annotations, signature))
    }

    fn read_annotation(&mut self, depth: usize) -> io::Result<Annotation> {
        if depth > MAX_NESTING {
            return Err(invalid(format!(
                "annotation values nested deeper than {MAX_NESTING} levels"
            )));
        }
        let descriptor = self.read_utf8()?;
        let mut annotation = Annotation::new(descriptor_to_type(&descriptor)?);
        let pairs = self.cursor.read_u16::<BigEndian>()?;
        for _ in 0..pairs {
            let name = self.read_utf8()?;
            let value = self.read_element_value(depth)?;
            annotation.elements.push((name, value));
        }
        Ok(annotation)
    }

    fn read_element_value(&mut self, depth: usize) -> io::Result<ElementValue> {
        let tag = self.cursor.read_u8()?;
        let value = match tag {
            b'B' | b'I' | b'S' | b'C' | b'Z' | b'J' | b'D' | b'F' => {
                let index = self.cursor.read_u16::<BigEndian>()?;
                let constant = self.entry(index)?.clone();
                match (tag, constant) {
                    (b'Z', PoolEntry::Integer(v)) => ElementValue::Boolean(v != 0),
                    (b'C', PoolEntry::Integer(v)) => {
                        ElementValue::Char(char::from_u32(v as u32).unwrap_or('\u{fffd}'))
                    }
                    (_, PoolEntry::Integer(v)) => ElementValue::Int(v as i64),
                    (_, PoolEntry::Long(v)) => ElementValue::Int(v),
                    (_, PoolEntry::Float(v)) => ElementValue::Float(v as f64),
                    (_, PoolEntry::Double(v)) => ElementValue::Float(v),
                    _ => return Err(invalid(format!("constant {index} does not match tag"))),
                }
            }
            b's' => ElementValue::String(self.read_utf8()?),
            b'e' => {
                let type_name = descriptor_to_type(&self.read_utf8()?)?;
                let constant = self.read_utf8()?;
                ElementValue::Enum {
                    type_name,
                    constant,
                }
            }
            b'c' => ElementValue::Class(descriptor_to_type(
                &self.read_utf8()?,
            )?),
            b'@' => ElementValue::Annotation(self.read_annotation(depth + 1)?),
            b'[' => {
                if depth >= MAX_NESTING {
                    return Err(invalid(format!(
                        "annotation values nested deeper than {MAX_NESTING} levels"
                    )));
                }
                let count = self.cursor.read_u16::<BigEndian>()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(self.read_element_value(depth + 1)?);
                }
                ElementValue::Array(values)
            }
            other => {
                return Err(invalid(format!(
                    "unknown element value tag '{}'",
                    other as char
                )));
            }
        };
        Ok(value)
    }
}

/// Convert a field descriptor such as `Ljava/lang/String;` or `[I` to a type name
pub fn descriptor_to_type(descriptor: &str) -> io::Result<String> {
    let mut chars = descriptor.chars().peekable();
    let name = parse_field_type(&mut chars)?;
    if chars.next().is_some() {
        return Err(invalid(format!("trailing characters in descriptor {descriptor}")));
    }
    Ok(name)
}

/// Parameter types of a method descriptor such as `(Ljava/lang/String;I)V`
pub fn method_parameter_types(descriptor: &str) -> io::Result<Vec<String>> {
    let mut chars = descriptor.chars().peekable();
    if chars.next() != Some('(') {
        return Err(invalid(format!("bad method descriptor {descriptor}")));
    }
    let mut types = Vec::new();
    while chars.peek().is_some_and(|c| *c != ')') {
        types.push(parse_field_type(&mut chars)?);
    }
    chars.next();
    Ok(types)
}

/// Return type of a method descriptor
pub fn method_return_type(descriptor: &str) -> io::Result<String> {
    let start = descriptor
        .find(')')
        .ok_or_else(|| invalid(format!("bad method descriptor {descriptor}")))?;
    descriptor_to_type(&descriptor[start + 1..])
}

type Chars<'s> = std::iter::Peekable<std::str::Chars<'s>>;

/// Consume leading `[`s and return how many there were
fn array_dimensions(chars: &mut Chars<'_>) -> io::Result<usize> {
    let mut dimensions = 0;
    while chars.next_if_eq(&'[').is_some() {
        dimensions += 1;
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(invalid(format!(
                "array type has more than {MAX_ARRAY_DIMENSIONS} dimensions"
            )));
        }
    }
    Ok(dimensions)
}

fn with_dimensions(mut name: String, dimensions: usize) -> String {
    name.push_str(&"[]".repeat(dimensions));
    name
}

fn parse_field_type(chars: &mut Chars<'_>) -> io::Result<String> {
    let dimensions = array_dimensions(chars)?;
    let c = chars
        .next()
        .ok_or_else(|| invalid("unexpected end of descriptor"))?;
    let name = match c {
        'B' => "byte".to_string(),
        'C' => "char".to_string(),
        'D' => "double".to_string(),
        'F' => "float".to_string(),
        'I' => "int".to_string(),
        'J' => "long".to_string(),
        'S' => "short".to_string(),
        'Z' => "boolean".to_string(),
        'V' if dimensions == 0 => "void".to_string(),
        'L' => {
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break name,
                    Some('/') => name.push('.'),
                    Some(c) => name.push(c),
                    None => return Err(invalid("unterminated class descriptor")),
                }
            }
        }
        other => return Err(invalid(format!("unknown descriptor character '{other}'"))),
    };
    Ok(with_dimensions(name, dimensions))
}

/// Render a field or parameter generic signature as a qualified type with
/// arguments, e.g. `Ljava/util/List<Ljava/lang/String;>;` becomes
/// `java.util.List<java.lang.String>`.
pub fn signature_to_type(signature: &str) -> io::Result<String> {
    let mut chars = signature.chars().peekable();
    parse_type_signature(&mut chars, 0)
}

/// Parameter types of a generic method signature, e.g. `(Ljava/util/List<Ljava/lang/String;>;)V`
pub fn method_signature_parameter_types(signature: &str) -> io::Result<Vec<String>> {
    // Skip formal type parameters such as `<T:Ljava/lang/Object;>`
    let start = signature
        .find('(')
        .ok_or_else(|| invalid(format!("bad method signature {signature}")))?;
    let mut chars = signature[start + 1..].chars().peekable();
    let mut types = Vec::new();
    while chars.peek().is_some_and(|c| *c != ')') {
        types.push(parse_type_signature(&mut chars, 0)?);
    }
    Ok(types)
}

fn parse_type_signature(chars: &mut Chars<'_>, depth: usize) -> io::Result<String> {
    if depth > MAX_NESTING {
        return Err(invalid(format!(
            "type arguments nested deeper than {MAX_NESTING} levels"
        )));
    }
    let dimensions = array_dimensions(chars)?;
    let name = match chars.peek().copied() {
        Some('L') => {
            chars.next();
            parse_class_signature(chars, depth)?
        }
        Some('T') => {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break name,
                    Some(c) => name.push(c),
                    None => return Err(invalid("unterminated type variable")),
                }
            }
        }
        Some(_) => parse_field_type(chars)?,
        None => return Err(invalid("unexpected end of signature")),
    };
    Ok(with_dimensions(name, dimensions))
}

fn parse_class_signature(chars: &mut Chars<'_>, depth: usize) -> io::Result<String> {
    let mut rendered = String::new();
    while let Some(c) = chars.next() {
        match c {
            ';' => return Ok(rendered),
            '/' => rendered.push('.'),
            '.' => rendered.push('$'),
            '<' => {
                let mut arguments = Vec::new();
                loop {
                    match chars.peek().copied() {
                        Some('>') => {
                            chars.next();
                            break;
                        }
                        Some('*') => {
                            chars.next();
                            arguments.push("?".to_string());
                        }
                        Some('+') => {
                            chars.next();
                            let bound = parse_type_signature(chars, depth + 1)?;
                            arguments.push(format!("? extends {bound}"));
                        }
                        Some('-') => {
                            chars.next();
                            let bound = parse_type_signature(chars, depth + 1)?;
                            arguments.push(format!("? super {bound}"));
                        }
                        Some(_) => arguments.push(parse_type_signature(chars, depth + 1)?),
                        None => return Err(invalid("unterminated type arguments")),
                    }
                }
                rendered.push('<');
                rendered.push_str(&arguments.join(","));
                rendered.push('>');
            }
            other => rendered.push(other),
        }
    }
    Err(invalid("unterminated class signature"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ClassFileBuilder;

    #[test]
    fn test_descriptor_conversion() {
        assert_eq!(descriptor_to_type("Ljava/lang/String;").unwrap(), "java.lang.String");
        assert_eq!(descriptor_to_type("[I").unwrap(), "int[]");
        assert_eq!(descriptor_to_type("[[Ljava/io/File;").unwrap(), "java.io.File[][]");
        assert!(descriptor_to_type("Ljava/lang/String").is_err());
    }

    #[test]
    fn test_method_descriptor() {
        assert_eq!(
            method_parameter_types("(Ljava/lang/String;I)V").unwrap(),
            vec!["java.lang.String", "int"]
        );
        assert_eq!(method_return_type("(Ljava/lang/String;)V").unwrap(), "void");
    }

    #[test]
    fn test_generic_signatures() {
        assert_eq!(
            signature_to_type("Ljava/util/Map<Ljava/lang/String;Ljava/lang/Integer;>;").unwrap(),
            "java.util.Map<java.lang.String,java.lang.Integer>"
        );
        assert_eq!(
            signature_to_type("Ljava/util/List<Ljava/util/List<Ljava/lang/String;>;>;").unwrap(),
            "java.util.List<java.util.List<java.lang.String>>"
        );
        assert_eq!(
            signature_to_type("Ljava/util/Collection<+Ljava/lang/Number;>;").unwrap(),
            "java.util.Collection<? extends java.lang.Number>"
        );
        assert_eq!(
            method_signature_parameter_types("(Ljava/util/List<Ljava/lang/String;>;)V").unwrap(),
            vec!["java.util.List<java.lang.String>"]
        );
    }

    #[test]
    fn test_parse_assembled_class() {
        let bytes = ClassFileBuilder::new("org.example.FooMojo")
            .extends("org.example.AbstractFooMojo")
            .annotate(
                Annotation::new("org.apache.maven.plugins.annotations.Mojo")
                    .with("name", ElementValue::String("foo".into()))
                    .with("threadSafe", ElementValue::Boolean(true))
                    .with(
                        "defaultPhase",
                        ElementValue::Enum {
                            type_name: "org.apache.maven.plugins.annotations.LifecyclePhase".into(),
                            constant: "PROCESS_SOURCES".into(),
                        },
                    ),
            )
            .field(
                "includes",
                "Ljava/util/List;",
                Some("Ljava/util/List<Ljava/lang/String;>;"),
                vec![Annotation::new("org.apache.maven.plugins.annotations.Parameter")
                    .with("property", ElementValue::String("foo.includes".into()))],
            )
            .build();

        let class = ClassFile::parse(&bytes, Path::new("FooMojo.class")).unwrap();
        assert_eq!(class.name, "org.example.FooMojo");
        assert_eq!(class.super_name.as_deref(), Some("org.example.AbstractFooMojo"));

        let mojo = &class.annotations[0];
        assert_eq!(mojo.string("name").as_deref(), Some("foo"));
        assert_eq!(mojo.boolean("threadSafe"), Some(true));
        assert_eq!(mojo.enum_constant("defaultPhase").as_deref(), Some("PROCESS_SOURCES"));

        let field = &class.fields[0];
        assert_eq!(field.name, "includes");
        assert_eq!(
            field.signature.as_deref(),
            Some("Ljava/util/List<Ljava/lang/String;>;")
        );
        assert_eq!(
            field
                .annotation("org.apache.maven.plugins.annotations.Parameter")
                .and_then(|a| a.string("property"))
                .as_deref(),
            Some("foo.includes")
        );
    }

    #[test]
    fn test_truncated_class_names_path() {
        let bytes = ClassFileBuilder::new("org.example.Broken").build();
        let err = ClassFile::parse(&bytes[..bytes.len() / 2], Path::new("broken/Broken.class"))
            .unwrap_err();
        assert!(err.to_string().contains("broken/Broken.class"));
    }

    #[test]
    fn test_array_dimensions_are_bounded() {
        let widest = format!("{}I", "[".repeat(MAX_ARRAY_DIMENSIONS));
        assert!(descriptor_to_type(&widest).unwrap().ends_with("int[][]"));
        assert!(descriptor_to_type(&format!("[{widest}")).is_err());
        assert!(signature_to_type(&format!("[{widest}")).is_err());
        assert_eq!(
            signature_to_type("[Ljava/util/List<[Ljava/lang/String;>;").unwrap(),
            "java.util.List<java.lang.String[]>[]"
        );
        assert!(descriptor_to_type("[V").is_err());
    }

    #[test]
    fn test_deeply_nested_signature_is_rejected() {
        let depth = 10_000;
        let signature = format!(
            "{}Ljava/lang/String;{}",
            "Ljava/util/List<".repeat(depth),
            ">;".repeat(depth)
        );
        assert!(signature_to_type(&signature).is_err());
    }

    #[test]
    fn test_deeply_nested_annotation_values_are_rejected() {
        let mut value = ElementValue::Int(1);
        for _ in 0..200 {
            value = ElementValue::Array(vec![value]);
        }
        let bytes = ClassFileBuilder::new("org.example.Nested")
            .annotate(Annotation::new("org.example.Marker").with("value", value))
            .build();
        let err = ClassFile::parse(&bytes, Path::new("Nested.class")).unwrap_err();
        assert!(matches!(err, Error::ClassFormat { .. }));
        assert!(err.to_string().contains("Nested.class"));
    }

    #[test]
    fn test_bad_magic() {
        let err = ClassFile::parse(b"not a class", Path::new("x.class")).unwrap_err();
        assert!(matches!(err, Error::ClassFormat { .. }));
    }
}
