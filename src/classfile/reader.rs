//! Class-file reader: raw `.class` bytes to a [`ClassNode`].
//!
//! Reads exactly what the verification engine consumes: the constant pool,
//! access flags, superclass and interfaces, field and method tables, the
//! `ConstantValue` and `Deprecated` attributes, marker annotations, and the
//! member-reference instructions of each `Code` attribute. Stack map frames,
//! generic signatures and debug attributes are skipped without being
//! modeled.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};
use thiserror::Error;

use crate::classfile::opcodes;
use crate::classfile::{
    ClassNode, ConstantValue, FieldAccessKind, FieldNode, Instruction, InstructionKind,
    InvokeKind, MethodNode, TypeOpKind,
};
use crate::consts::{
    DEPRECATED_ANNOTATION, EXPERIMENTAL_API_ANNOTATION, INTERNAL_API_ANNOTATION,
    MIN_CLASS_FILE_MAJOR,
};

#[derive(Error, Debug)]
pub enum ClassReadError {
    #[error("unexpected end of class file")]
    UnexpectedEof(#[from] io::Error),

    #[error("bad magic number 0x{0:08x}")]
    BadMagic(u32),

    #[error("unsupported class file major version {0}")]
    UnsupportedVersion(u16),

    #[error("constant pool index {0} out of bounds")]
    BadConstantPoolIndex(u16),

    #[error("constant pool index {index} holds {found}, expected {expected}")]
    ConstantTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unrecognized constant pool tag {0}")]
    UnknownConstantTag(u8),

    #[error("malformed modified UTF-8 in constant pool")]
    InvalidUtf8,

    #[error("malformed annotation attribute")]
    MalformedAnnotation,

    #[error("unrecognized opcode 0x{opcode:02x} at code offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("truncated Code attribute")]
    TruncatedCode,
}

type Result<T> = std::result::Result<T, ClassReadError>;

/// Parse one class file.
pub fn read_class(bytes: &[u8]) -> Result<ClassNode> {
    let mut r = Cursor::new(bytes);

    let magic = r.read_u32::<BigEndian>()?;
    if magic != 0xCAFE_BABE {
        return Err(ClassReadError::BadMagic(magic));
    }
    let _minor = r.read_u16::<BigEndian>()?;
    let major = r.read_u16::<BigEndian>()?;
    if major < MIN_CLASS_FILE_MAJOR {
        return Err(ClassReadError::UnsupportedVersion(major));
    }

    let pool = ConstantPool::read(&mut r)?;

    let access = r.read_u16::<BigEndian>()?;
    let this_class = r.read_u16::<BigEndian>()?;
    let name = pool.class_name(this_class)?.to_string();

    let super_index = r.read_u16::<BigEndian>()?;
    let super_name = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?.to_string())
    };

    let interface_count = r.read_u16::<BigEndian>()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let idx = r.read_u16::<BigEndian>()?;
        interfaces.push(pool.class_name(idx)?.to_string());
    }

    let field_count = r.read_u16::<BigEndian>()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_field(&mut r, &pool)?);
    }

    let method_count = r.read_u16::<BigEndian>()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(read_method(&mut r, &pool)?);
    }

    let class_attrs = read_attributes(&mut r, &pool)?;

    Ok(ClassNode {
        name,
        access,
        major_version: major,
        super_name,
        interfaces,
        fields,
        methods,
        is_deprecated: class_attrs.deprecated,
        is_experimental: class_attrs.has_annotation(EXPERIMENTAL_API_ANNOTATION),
        is_internal_api: class_attrs.has_annotation(INTERNAL_API_ANNOTATION),
    })
}

// ---------------------------------------------------------------------------
// Constant pool

enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    Str(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
    /// Second slot of a long/double entry; never referenced directly.
    Unusable,
}

impl Constant {
    fn tag_name(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class(_) => "Class",
            Constant::Str(_) => "String",
            Constant::FieldRef(..) => "Fieldref",
            Constant::MethodRef(..) => "Methodref",
            Constant::InterfaceMethodRef(..) => "InterfaceMethodref",
            Constant::NameAndType(..) => "NameAndType",
            Constant::MethodHandle => "MethodHandle",
            Constant::MethodType => "MethodType",
            Constant::Dynamic => "Dynamic",
            Constant::InvokeDynamic => "InvokeDynamic",
            Constant::Module => "Module",
            Constant::Package => "Package",
            Constant::Unusable => "unusable slot",
        }
    }
}

/// Reference to a member, resolved through `Fieldref`/`Methodref`/
/// `InterfaceMethodref` and its `NameAndType`.
struct MemberRef<'a> {
    owner: &'a str,
    name: &'a str,
    descriptor: &'a str,
    interface: bool,
}

struct ConstantPool {
    // Index 0 is unused, as in the class file format.
    constants: Vec<Constant>,
}

impl ConstantPool {
    fn read(r: &mut Cursor<&[u8]>) -> Result<ConstantPool> {
        let count = r.read_u16::<BigEndian>()?;
        let mut constants = Vec::with_capacity(count as usize);
        constants.push(Constant::Unusable);
        let mut index = 1;
        while index < count {
            let tag = r.read_u8()?;
            let constant = match tag {
                1 => {
                    let len = r.read_u16::<BigEndian>()?;
                    let mut raw = vec![0u8; len as usize];
                    r.read_exact(&mut raw)?;
                    Constant::Utf8(decode_modified_utf8(&raw)?)
                }
                3 => Constant::Integer(r.read_i32::<BigEndian>()?),
                4 => Constant::Float(f32::from_bits(r.read_u32::<BigEndian>()?)),
                5 => Constant::Long(r.read_i64::<BigEndian>()?),
                6 => Constant::Double(f64::from_bits(r.read_u64::<BigEndian>()?)),
                7 => Constant::Class(r.read_u16::<BigEndian>()?),
                8 => Constant::Str(r.read_u16::<BigEndian>()?),
                9 => Constant::FieldRef(r.read_u16::<BigEndian>()?, r.read_u16::<BigEndian>()?),
                10 => Constant::MethodRef(r.read_u16::<BigEndian>()?, r.read_u16::<BigEndian>()?),
                11 => Constant::InterfaceMethodRef(
                    r.read_u16::<BigEndian>()?,
                    r.read_u16::<BigEndian>()?,
                ),
                12 => Constant::NameAndType(r.read_u16::<BigEndian>()?, r.read_u16::<BigEndian>()?),
                15 => {
                    r.read_u8()?;
                    r.read_u16::<BigEndian>()?;
                    Constant::MethodHandle
                }
                16 => {
                    r.read_u16::<BigEndian>()?;
                    Constant::MethodType
                }
                17 => {
                    r.read_u16::<BigEndian>()?;
                    r.read_u16::<BigEndian>()?;
                    Constant::Dynamic
                }
                18 => {
                    r.read_u16::<BigEndian>()?;
                    r.read_u16::<BigEndian>()?;
                    Constant::InvokeDynamic
                }
                19 => {
                    r.read_u16::<BigEndian>()?;
                    Constant::Module
                }
                20 => {
                    r.read_u16::<BigEndian>()?;
                    Constant::Package
                }
                other => return Err(ClassReadError::UnknownConstantTag(other)),
            };
            let double_width = matches!(constant, Constant::Long(_) | Constant::Double(_));
            constants.push(constant);
            index += 1;
            if double_width {
                constants.push(Constant::Unusable);
                index += 1;
            }
        }
        Ok(ConstantPool { constants })
    }

    fn get(&self, index: u16) -> Result<&Constant> {
        self.constants
            .get(index as usize)
            .ok_or(ClassReadError::BadConstantPoolIndex(index))
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            other => Err(ClassReadError::ConstantTypeMismatch {
                index,
                expected: "Utf8",
                found: other.tag_name(),
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8(*name_index),
            other => Err(ClassReadError::ConstantTypeMismatch {
                index,
                expected: "Class",
                found: other.tag_name(),
            }),
        }
    }

    fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType(name_index, descriptor_index) => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            other => Err(ClassReadError::ConstantTypeMismatch {
                index,
                expected: "NameAndType",
                found: other.tag_name(),
            }),
        }
    }

    fn member_ref(&self, index: u16, expected: &'static str) -> Result<MemberRef<'_>> {
        let (class_index, nat_index, interface) = match self.get(index)? {
            Constant::FieldRef(c, n) => (*c, *n, false),
            Constant::MethodRef(c, n) => (*c, *n, false),
            Constant::InterfaceMethodRef(c, n) => (*c, *n, true),
            other => {
                return Err(ClassReadError::ConstantTypeMismatch {
                    index,
                    expected,
                    found: other.tag_name(),
                })
            }
        };
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            owner: self.class_name(class_index)?,
            name,
            descriptor,
            interface,
        })
    }
}

/// Decode the class file format's modified UTF-8 (CESU-8 with `C0 80` for
/// NUL, surrogate pairs as paired 3-byte sequences).
fn decode_modified_utf8(raw: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let a = raw[i] as u32;
        let unit = if a & 0x80 == 0 {
            if a == 0 {
                return Err(ClassReadError::InvalidUtf8);
            }
            i += 1;
            a
        } else if a & 0xe0 == 0xc0 {
            let b = *raw.get(i + 1).ok_or(ClassReadError::InvalidUtf8)? as u32;
            if b & 0xc0 != 0x80 {
                return Err(ClassReadError::InvalidUtf8);
            }
            i += 2;
            ((a & 0x1f) << 6) | (b & 0x3f)
        } else if a & 0xf0 == 0xe0 {
            let b = *raw.get(i + 1).ok_or(ClassReadError::InvalidUtf8)? as u32;
            let c = *raw.get(i + 2).ok_or(ClassReadError::InvalidUtf8)? as u32;
            if b & 0xc0 != 0x80 || c & 0xc0 != 0x80 {
                return Err(ClassReadError::InvalidUtf8);
            }
            i += 3;
            ((a & 0x0f) << 12) | ((b & 0x3f) << 6) | (c & 0x3f)
        } else {
            return Err(ClassReadError::InvalidUtf8);
        };
        units.push(unit as u16);
    }
    // Surrogate pairs survive as UTF-16 code units at this point.
    for chunk in char::decode_utf16(units.into_iter()) {
        out.push(chunk.map_err(|_| ClassReadError::InvalidUtf8)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Members and attributes

/// Attribute data the engine cares about, collected off one member or the
/// class itself.
#[derive(Default)]
struct AttributeSet {
    deprecated: bool,
    annotation_types: Vec<String>,
    constant_value: Option<ConstantValue>,
    code: Option<Vec<u8>>,
}

impl AttributeSet {
    fn has_annotation(&self, descriptor: &str) -> bool {
        self.annotation_types.iter().any(|a| a == descriptor)
    }

    fn is_deprecated(&self) -> bool {
        self.deprecated || self.has_annotation(DEPRECATED_ANNOTATION)
    }
}

fn read_field(r: &mut Cursor<&[u8]>, pool: &ConstantPool) -> Result<FieldNode> {
    let access = r.read_u16::<BigEndian>()?;
    let name = pool.utf8(r.read_u16::<BigEndian>()?)?.to_string();
    let descriptor = pool.utf8(r.read_u16::<BigEndian>()?)?.to_string();
    let attrs = read_attributes(r, pool)?;
    Ok(FieldNode {
        name,
        descriptor,
        access,
        constant_value: attrs.constant_value.clone(),
        is_deprecated: attrs.is_deprecated(),
    })
}

fn read_method(r: &mut Cursor<&[u8]>, pool: &ConstantPool) -> Result<MethodNode> {
    let access = r.read_u16::<BigEndian>()?;
    let name = pool.utf8(r.read_u16::<BigEndian>()?)?.to_string();
    let descriptor = pool.utf8(r.read_u16::<BigEndian>()?)?.to_string();
    let attrs = read_attributes(r, pool)?;
    let instructions = match &attrs.code {
        Some(code) => extract_instructions(code, pool)?,
        None => Vec::new(),
    };
    Ok(MethodNode {
        name,
        descriptor,
        access,
        instructions,
        is_deprecated: attrs.is_deprecated(),
    })
}

fn read_attributes(r: &mut Cursor<&[u8]>, pool: &ConstantPool) -> Result<AttributeSet> {
    let count = r.read_u16::<BigEndian>()?;
    let mut set = AttributeSet::default();
    for _ in 0..count {
        let name_index = r.read_u16::<BigEndian>()?;
        let length = r.read_u32::<BigEndian>()?;
        let mut payload = vec![0u8; length as usize];
        r.read_exact(&mut payload)?;

        match pool.utf8(name_index)? {
            "Deprecated" => set.deprecated = true,
            "ConstantValue" => {
                let mut p = Cursor::new(payload.as_slice());
                let value_index = p.read_u16::<BigEndian>()?;
                set.constant_value = Some(read_constant_value(pool, value_index)?);
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                collect_annotation_types(&payload, pool, &mut set.annotation_types)?;
            }
            "Code" => {
                let mut p = Cursor::new(payload.as_slice());
                let _max_stack = p.read_u16::<BigEndian>()?;
                let _max_locals = p.read_u16::<BigEndian>()?;
                let code_length = p.read_u32::<BigEndian>()? as usize;
                let mut code = vec![0u8; code_length];
                p.read_exact(&mut code)?;
                set.code = Some(code);
                // Exception table and nested attributes are not modeled.
            }
            _ => {}
        }
    }
    Ok(set)
}

fn read_constant_value(pool: &ConstantPool, index: u16) -> Result<ConstantValue> {
    match pool.get(index)? {
        Constant::Integer(v) => Ok(ConstantValue::Integer(*v)),
        Constant::Long(v) => Ok(ConstantValue::Long(*v)),
        Constant::Float(v) => Ok(ConstantValue::Float(*v)),
        Constant::Double(v) => Ok(ConstantValue::Double(*v)),
        Constant::Str(utf8_index) => Ok(ConstantValue::String(pool.utf8(*utf8_index)?.to_string())),
        other => Err(ClassReadError::ConstantTypeMismatch {
            index,
            expected: "constant value",
            found: other.tag_name(),
        }),
    }
}

fn collect_annotation_types(
    payload: &[u8],
    pool: &ConstantPool,
    out: &mut Vec<String>,
) -> Result<()> {
    let mut r = Cursor::new(payload);
    let count = r.read_u16::<BigEndian>()?;
    for _ in 0..count {
        let type_descriptor = read_annotation(&mut r, pool)?;
        out.push(type_descriptor);
    }
    Ok(())
}

fn read_annotation(r: &mut Cursor<&[u8]>, pool: &ConstantPool) -> Result<String> {
    let type_index = r.read_u16::<BigEndian>()?;
    let type_descriptor = pool.utf8(type_index)?.to_string();
    let pair_count = r.read_u16::<BigEndian>()?;
    for _ in 0..pair_count {
        let _element_name = r.read_u16::<BigEndian>()?;
        skip_element_value(r, pool)?;
    }
    Ok(type_descriptor)
}

fn skip_element_value(r: &mut Cursor<&[u8]>, pool: &ConstantPool) -> Result<()> {
    let tag = r.read_u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            r.read_u16::<BigEndian>()?;
        }
        b'e' => {
            r.read_u16::<BigEndian>()?;
            r.read_u16::<BigEndian>()?;
        }
        b'@' => {
            read_annotation(r, pool)?;
        }
        b'[' => {
            let count = r.read_u16::<BigEndian>()?;
            for _ in 0..count {
                skip_element_value(r, pool)?;
            }
        }
        _ => return Err(ClassReadError::MalformedAnnotation),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction extraction

fn extract_instructions(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut offset = 0usize;
    while offset < code.len() {
        let opcode = code[offset];
        let length = instruction_length(code, offset, opcode)?;
        if offset + length > code.len() {
            return Err(ClassReadError::TruncatedCode);
        }

        let kind = match opcode {
            opcodes::GETSTATIC | opcodes::PUTSTATIC | opcodes::GETFIELD | opcodes::PUTFIELD => {
                let member = pool.member_ref(read_u16_at(code, offset + 1)?, "Fieldref")?;
                Some(InstructionKind::FieldAccess {
                    kind: match opcode {
                        opcodes::GETSTATIC => FieldAccessKind::GetStatic,
                        opcodes::PUTSTATIC => FieldAccessKind::PutStatic,
                        opcodes::GETFIELD => FieldAccessKind::GetField,
                        _ => FieldAccessKind::PutField,
                    },
                    owner: member.owner.to_string(),
                    name: member.name.to_string(),
                    descriptor: member.descriptor.to_string(),
                })
            }
            opcodes::INVOKEVIRTUAL
            | opcodes::INVOKESPECIAL
            | opcodes::INVOKESTATIC
            | opcodes::INVOKEINTERFACE => {
                let member = pool.member_ref(read_u16_at(code, offset + 1)?, "Methodref")?;
                Some(InstructionKind::Invoke {
                    kind: match opcode {
                        opcodes::INVOKEVIRTUAL => InvokeKind::Virtual,
                        opcodes::INVOKESPECIAL => InvokeKind::Special,
                        opcodes::INVOKESTATIC => InvokeKind::Static,
                        _ => InvokeKind::Interface,
                    },
                    owner: member.owner.to_string(),
                    name: member.name.to_string(),
                    descriptor: member.descriptor.to_string(),
                    interface_call: member.interface,
                })
            }
            opcodes::NEW | opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF
            | opcodes::MULTIANEWARRAY => {
                let type_name = pool.class_name(read_u16_at(code, offset + 1)?)?.to_string();
                Some(InstructionKind::TypeOp {
                    kind: match opcode {
                        opcodes::NEW => TypeOpKind::New,
                        opcodes::ANEWARRAY => TypeOpKind::ANewArray,
                        opcodes::CHECKCAST => TypeOpKind::CheckCast,
                        opcodes::INSTANCEOF => TypeOpKind::InstanceOf,
                        _ => TypeOpKind::MultiANewArray,
                    },
                    type_name,
                })
            }
            opcodes::LDC => {
                let index = *code.get(offset + 1).ok_or(ClassReadError::TruncatedCode)? as u16;
                ldc_class(pool, index)?
            }
            opcodes::LDC_W => {
                let index = read_u16_at(code, offset + 1)?;
                ldc_class(pool, index)?
            }
            _ => None,
        };

        if let Some(kind) = kind {
            instructions.push(Instruction {
                offset: offset as u32,
                kind,
            });
        }
        offset += length;
    }
    Ok(instructions)
}

/// An `ldc` of a `Class` constant; other `ldc` operands are uninteresting.
fn ldc_class(pool: &ConstantPool, index: u16) -> Result<Option<InstructionKind>> {
    match pool.get(index)? {
        Constant::Class(name_index) => Ok(Some(InstructionKind::LdcClass {
            type_name: pool.utf8(*name_index)?.to_string(),
        })),
        _ => Ok(None),
    }
}

fn instruction_length(code: &[u8], offset: usize, opcode: u8) -> Result<usize> {
    match opcode {
        opcodes::WIDE => {
            let modified = *code.get(offset + 1).ok_or(ClassReadError::TruncatedCode)?;
            if modified == opcodes::IINC {
                Ok(6)
            } else {
                Ok(4)
            }
        }
        opcodes::TABLESWITCH => {
            let pad = opcodes::switch_padding(offset);
            let base = offset + 1 + pad;
            let low = read_i32_at(code, base + 4)?;
            let high = read_i32_at(code, base + 8)?;
            if high < low {
                return Err(ClassReadError::TruncatedCode);
            }
            let entries = (high - low + 1) as usize;
            Ok(1 + pad + 12 + entries * 4)
        }
        opcodes::LOOKUPSWITCH => {
            let pad = opcodes::switch_padding(offset);
            let base = offset + 1 + pad;
            let npairs = read_i32_at(code, base + 4)?;
            if npairs < 0 {
                return Err(ClassReadError::TruncatedCode);
            }
            Ok(1 + pad + 8 + npairs as usize * 8)
        }
        other => opcodes::fixed_length(other).ok_or(ClassReadError::UnknownOpcode {
            opcode,
            offset,
        }),
    }
}

fn read_u16_at(code: &[u8], offset: usize) -> Result<u16> {
    let bytes = code
        .get(offset..offset + 2)
        .ok_or(ClassReadError::TruncatedCode)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_i32_at(code: &[u8], offset: usize) -> Result<i32> {
    let bytes = code
        .get(offset..offset + 4)
        .ok_or(ClassReadError::TruncatedCode)?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
