//! Assembles class files and archives in memory so scanner tests do not need
//! a Java compiler.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::scanner::class_file::{ACC_PUBLIC, Annotation, ElementValue};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Constant {
    Utf8(String),
    Class(u16),
    Integer(i32),
    Long(i64),
    Double(u64),
}

#[derive(Default)]
struct ConstantPool {
    entries: Vec<Constant>,
    slots: u16,
    index: HashMap<Constant, u16>,
}

impl ConstantPool {
    fn add(&mut self, constant: Constant) -> u16 {
        if let Some(index) = self.index.get(&constant) {
            return *index;
        }
        let index = self.slots + 1;
        self.slots += match constant {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        };
        self.index.insert(constant.clone(), index);
        self.entries.push(constant);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.add(Constant::Utf8(value.to_string()))
    }

    fn class(&mut self, dotted: &str) -> u16 {
        let name = self.utf8(&dotted.replace('.', "/"));
        self.add(Constant::Class(name))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.slots + 1).to_be_bytes());
        for entry in &self.entries {
            match entry {
                Constant::Utf8(value) => {
                    out.push(1);
                    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
                    out.extend_from_slice(value.as_bytes());
                }
                Constant::Class(name) => {
                    out.push(7);
                    out.extend_from_slice(&name.to_be_bytes());
                }
                Constant::Integer(value) => {
                    out.push(3);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Long(value) => {
                    out.push(5);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Double(bits) => {
                    out.push(6);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
            }
        }
    }
}

struct FixtureMember {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: Vec<Annotation>,
}

/// Builder for a class file with annotations on the class and its members
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    annotations: Vec<Annotation>,
    visible_annotations: Vec<Annotation>,
    fields: Vec<FixtureMember>,
    methods: Vec<FixtureMember>,
}

impl ClassFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some("java.lang.Object".to_string()),
            annotations: Vec::new(),
            visible_annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_string());
        self
    }

    /// Class-retention annotation (stored as runtime invisible)
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Runtime-retention annotation such as `java.lang.Deprecated`
    pub fn annotate_visible(mut self, annotation: Annotation) -> Self {
        self.visible_annotations.push(annotation);
        self
    }

    pub fn field(
        mut self,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        annotations: Vec<Annotation>,
    ) -> Self {
        self.fields.push(FixtureMember {
            access_flags: 0x0002,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: signature.map(str::to_string),
            annotations,
        });
        self
    }

    pub fn method(
        mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        annotations: Vec<Annotation>,
    ) -> Self {
        self.methods.push(FixtureMember {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = ConstantPool::default();
        let mut body = Vec::new();

        body.extend_from_slice(&(ACC_PUBLIC | 0x0020).to_be_bytes());
        let this_class = pool.class(&self.name);
        body.extend_from_slice(&this_class.to_be_bytes());
        let super_class = match &self.super_name {
            Some(name) => pool.class(name),
            None => 0,
        };
        body.extend_from_slice(&super_class.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());

        for members in [&self.fields, &self.methods] {
            body.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for member in members {
                body.extend_from_slice(&member.access_flags.to_be_bytes());
                body.extend_from_slice(&pool.utf8(&member.name).to_be_bytes());
                body.extend_from_slice(&pool.utf8(&member.descriptor).to_be_bytes());

                let mut attributes = Vec::new();
                if let Some(signature) = &member.signature {
                    let value = pool.utf8(signature);
                    attributes.push(("Signature", value.to_be_bytes().to_vec()));
                }
                if !member.annotations.is_empty() {
                    attributes.push((
                        "RuntimeInvisibleAnnotations",
                        encode_annotations(&mut pool, &member.annotations),
                    ));
                }
                write_attributes(&mut pool, &mut body, attributes);
            }
        }

        let mut attributes = Vec::new();
        if !self.annotations.is_empty() {
            attributes.push((
                "RuntimeInvisibleAnnotations",
                encode_annotations(&mut pool, &self.annotations),
            ));
        }
        if !self.visible_annotations.is_empty() {
            attributes.push((
                "RuntimeVisibleAnnotations",
                encode_annotations(&mut pool, &self.visible_annotations),
            ));
        }
        attributes.push(("SourceFile", pool.utf8("Fixture.java").to_be_bytes().to_vec()));
        write_attributes(&mut pool, &mut body, attributes);

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        pool.write(&mut out);
        out.extend_from_slice(&body);
        out
    }
}

fn write_attributes(pool: &mut ConstantPool, out: &mut Vec<u8>, attributes: Vec<(&str, Vec<u8>)>) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for (name, payload) in attributes {
        out.extend_from_slice(&pool.utf8(name).to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&payload);
    }
}

fn type_descriptor(type_name: &str) -> String {
    match type_name {
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "double" => "D".to_string(),
        "float" => "F".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "short" => "S".to_string(),
        "boolean" => "Z".to_string(),
        "void" => "V".to_string(),
        other => match other.strip_suffix("[]") {
            Some(element) => format!("[{}", type_descriptor(element)),
            None => format!("L{};", other.replace('.', "/")),
        },
    }
}

fn encode_annotations(pool: &mut ConstantPool, annotations: &[Annotation]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        encode_annotation(pool, annotation, &mut out);
    }
    out
}

fn encode_annotation(pool: &mut ConstantPool, annotation: &Annotation, out: &mut Vec<u8>) {
    let descriptor = type_descriptor(&annotation.type_name);
    out.extend_from_slice(&pool.utf8(&descriptor).to_be_bytes());
    out.extend_from_slice(&(annotation.elements.len() as u16).to_be_bytes());
    for (name, value) in &annotation.elements {
        out.extend_from_slice(&pool.utf8(name).to_be_bytes());
        encode_value(pool, value, out);
    }
}

fn encode_value(pool: &mut ConstantPool, value: &ElementValue, out: &mut Vec<u8>) {
    match value {
        ElementValue::Boolean(v) => {
            out.push(b'Z');
            out.extend_from_slice(&pool.add(Constant::Integer(*v as i32)).to_be_bytes());
        }
        ElementValue::Int(v) => {
            out.push(b'J');
            out.extend_from_slice(&pool.add(Constant::Long(*v)).to_be_bytes());
        }
        ElementValue::Float(v) => {
            out.push(b'D');
            out.extend_from_slice(&pool.add(Constant::Double(v.to_bits())).to_be_bytes());
        }
        ElementValue::Char(v) => {
            out.push(b'C');
            out.extend_from_slice(&pool.add(Constant::Integer(*v as i32)).to_be_bytes());
        }
        ElementValue::String(v) => {
            out.push(b's');
            out.extend_from_slice(&pool.utf8(v).to_be_bytes());
        }
        ElementValue::Enum {
            type_name,
            constant,
        } => {
            out.push(b'e');
            out.extend_from_slice(&pool.utf8(&type_descriptor(type_name)).to_be_bytes());
            out.extend_from_slice(&pool.utf8(constant).to_be_bytes());
        }
        ElementValue::Class(type_name) => {
            out.push(b'c');
            out.extend_from_slice(&pool.utf8(&type_descriptor(type_name)).to_be_bytes());
        }
        ElementValue::Annotation(nested) => {
            out.push(b'@');
            encode_annotation(pool, nested, out);
        }
        ElementValue::Array(values) => {
            out.push(b'[');
            out.extend_from_slice(&(values.len() as u16).to_be_bytes());
            for value in values {
                encode_value(pool, value, out);
            }
        }
    }
}

/// Write `entries` as a jar archive at `path`
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) -> zip::result::ZipResult<()> {
    let file = File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    writer.finish()?;
    Ok(())
}

/// Write `bytes` as a class file below `root` following the package layout
pub fn write_class(root: &Path, class_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    let path = root.join(format!("{}.class", class_name.replace('.', "/")));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
