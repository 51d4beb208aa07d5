use thiserror::Error;

use super::{JavaType, MemberDeclaration, TypeDeclaration};

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("descriptor `{0}` has more than 255 array dimensions")]
    TooManyDimensions(String),
}

/// The JVM's limit on array dimensions
const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Read the declaration surface of a class file: its name, supertypes,
/// fields and methods. Constructors and static initializers are skipped.
pub fn parse_class(bytes: &[u8]) -> Result<TypeDeclaration, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    reader.skip(4)?; // minor + major version
    let pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let mut declaration = TypeDeclaration::new(pool.class_name(this_class)?);
    if super_class != 0 {
        declaration.super_class = Some(pool.class_name(super_class)?);
    }

    let interfaces_count = reader.read_u2()?;
    for _ in 0..interfaces_count {
        let index = reader.read_u2()?;
        declaration.interfaces.push(pool.class_name(index)?);
    }

    let fields_count = reader.read_u2()?;
    for _ in 0..fields_count {
        let (name, descriptor) = read_member(&mut reader, &pool)?;
        let ty = parse_field_descriptor(descriptor)?;
        declaration.fields.push(MemberDeclaration::new(name, ty));
    }

    let methods_count = reader.read_u2()?;
    for _ in 0..methods_count {
        let (name, descriptor) = read_member(&mut reader, &pool)?;
        if name == "<init>" || name == "<clinit>" {
            continue;
        }
        let (_, return_type) = parse_method_descriptor(descriptor)?;
        declaration.methods.push(MemberDeclaration::new(name, return_type));
    }

    // Class attributes carry nothing the resolver needs
    let attributes_count = reader.read_u2()?;
    skip_attributes(&mut reader, attributes_count)?;

    Ok(declaration)
}

fn read_member<'p>(
    reader: &mut ClassReader<'_>,
    pool: &'p ConstantPool,
) -> Result<(&'p str, &'p str), ClassParseError> {
    let _access_flags = reader.read_u2()?;
    let name_index = reader.read_u2()?;
    let descriptor_index = reader.read_u2()?;
    let attributes_count = reader.read_u2()?;
    skip_attributes(reader, attributes_count)?;
    Ok((pool.utf8(name_index)?, pool.utf8(descriptor_index)?))
}

fn skip_attributes(reader: &mut ClassReader<'_>, count: u16) -> Result<(), ClassParseError> {
    for _ in 0..count {
        reader.read_u2()?; // attribute_name_index
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class { name_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    // Modified UTF-8; obfuscated names may not survive strict decoding
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    // Long and Double take two slots
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    Constant::Unusable
                }
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(self.utf8(*name_index)?.to_string()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        if self.read_u4()? != 0xCAFEBABE {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }

    fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<JavaType, ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    let ty = parser.parse_type()?;
    if !parser.is_done() {
        return Err(ClassParseError::InvalidDescriptor(descriptor.to_string()));
    }
    Ok(ty)
}

/// Returns the parameter types and the return type (`void` as a primitive)
pub fn parse_method_descriptor(
    descriptor: &str,
) -> Result<(Vec<JavaType>, JavaType), ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek()? != b')' {
        parameters.push(parser.parse_type()?);
    }
    parser.expect(b')')?;

    let return_type = if parser.peek()? == b'V' {
        parser.pos += 1;
        JavaType::Primitive("void".to_string())
    } else {
        parser.parse_type()?
    };

    if !parser.is_done() {
        return Err(ClassParseError::InvalidDescriptor(descriptor.to_string()));
    }
    Ok((parameters, return_type))
}

struct DescriptorParser<'a> {
    descriptor: &'a str,
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self { descriptor, pos: 0 }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.descriptor.len()
    }

    fn invalid(&self) -> ClassParseError {
        ClassParseError::InvalidDescriptor(self.descriptor.to_string())
    }

    fn peek(&self) -> Result<u8, ClassParseError> {
        self.descriptor
            .as_bytes()
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.invalid())
    }

    fn expect(&mut self, byte: u8) -> Result<(), ClassParseError> {
        if self.peek()? != byte {
            return Err(self.invalid());
        }
        self.pos += 1;
        Ok(())
    }

    fn parse_type(&mut self) -> Result<JavaType, ClassParseError> {
        let mut dimensions = 0;
        while self.peek()? == b'[' {
            dimensions += 1;
            self.pos += 1;
        }
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(ClassParseError::TooManyDimensions(self.descriptor.to_string()));
        }
        Ok(self.parse_element()?.array_of(dimensions))
    }

    fn parse_element(&mut self) -> Result<JavaType, ClassParseError> {
        let tag = self.peek()?;
        self.pos += 1;
        let primitive = match tag {
            b'B' => "byte",
            b'C' => "char",
            b'D' => "double",
            b'F' => "float",
            b'I' => "int",
            b'J' => "long",
            b'S' => "short",
            b'Z' => "boolean",
            b'L' => {
                let rest = &self.descriptor[self.pos..];
                let end = rest.find(';').ok_or_else(|| self.invalid())?;
                let path = rest[..end].to_string();
                self.pos += end + 1;
                return Ok(JavaType::Class(path));
            }
            _ => return Err(self.invalid()),
        };
        Ok(JavaType::Primitive(primitive.to_string()))
    }
}

/// Assembles minimal class files for tests
#[cfg(test)]
pub(crate) mod fixture {
    pub struct ClassFileBuilder {
        name: String,
        super_class: Option<String>,
        fields: Vec<(String, String)>,
        methods: Vec<(String, String)>,
    }

    impl ClassFileBuilder {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                super_class: Some("java/lang/Object".to_string()),
                fields: Vec::new(),
                methods: Vec::new(),
            }
        }

        pub fn super_class(mut self, name: &str) -> Self {
            self.super_class = Some(name.to_string());
            self
        }

        pub fn no_super_class(mut self) -> Self {
            self.super_class = None;
            self
        }

        pub fn field(mut self, name: &str, descriptor: &str) -> Self {
            self.fields.push((name.to_string(), descriptor.to_string()));
            self
        }

        pub fn method(mut self, name: &str, descriptor: &str) -> Self {
            self.methods.push((name.to_string(), descriptor.to_string()));
            self
        }

        pub fn build(&self) -> Vec<u8> {
            let mut pool: Vec<Vec<u8>> = Vec::new();
            let utf8 = |pool: &mut Vec<Vec<u8>>, value: &str| -> u16 {
                let mut entry = vec![1u8];
                entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
                entry.extend_from_slice(value.as_bytes());
                pool.push(entry);
                pool.len() as u16
            };
            let class = |pool: &mut Vec<Vec<u8>>, name_index: u16| -> u16 {
                let mut entry = vec![7u8];
                entry.extend_from_slice(&name_index.to_be_bytes());
                pool.push(entry);
                pool.len() as u16
            };

            let name_index = utf8(&mut pool, &self.name);
            let this_class = class(&mut pool, name_index);
            let super_class = match &self.super_class {
                Some(name) => {
                    let index = utf8(&mut pool, name);
                    class(&mut pool, index)
                }
                None => 0,
            };
            let fields: Vec<(u16, u16)> = self
                .fields
                .iter()
                .map(|(name, descriptor)| (utf8(&mut pool, name), utf8(&mut pool, descriptor)))
                .collect();
            let methods: Vec<(u16, u16)> = self
                .methods
                .iter()
                .map(|(name, descriptor)| (utf8(&mut pool, name), utf8(&mut pool, descriptor)))
                .collect();

            let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
            bytes.extend_from_slice(&((pool.len() + 1) as u16).to_be_bytes());
            for entry in &pool {
                bytes.extend_from_slice(entry);
            }
            bytes.extend_from_slice(&0x0021u16.to_be_bytes());
            bytes.extend_from_slice(&this_class.to_be_bytes());
            bytes.extend_from_slice(&super_class.to_be_bytes());
            bytes.extend_from_slice(&0u16.to_be_bytes()); // interfaces
            for members in [&fields, &methods] {
                bytes.extend_from_slice(&(members.len() as u16).to_be_bytes());
                for (name, descriptor) in members {
                    bytes.extend_from_slice(&0x0001u16.to_be_bytes());
                    bytes.extend_from_slice(&name.to_be_bytes());
                    bytes.extend_from_slice(&descriptor.to_be_bytes());
                    bytes.extend_from_slice(&0u16.to_be_bytes());
                }
            }
            bytes.extend_from_slice(&0u16.to_be_bytes()); // attributes
            bytes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::ClassFileBuilder;
    use super::*;

    #[test]
    fn test_parse_class_surface() {
        let bytes = ClassFileBuilder::new("pkg/Other")
            .super_class("pkg/Base")
            .field("field", "I")
            .field("next", "Lpkg/Other;")
            .method("<init>", "()V")
            .method("names", "(I[J)[Ljava/lang/String;")
            .build();

        let decl = parse_class(&bytes).unwrap();
        assert_eq!(decl.path, "pkg/Other");
        assert_eq!(decl.super_class.as_deref(), Some("pkg/Base"));
        assert_eq!(decl.fields.len(), 2);
        assert_eq!(decl.fields[1].ty, JavaType::Class("pkg/Other".to_string()));
        assert_eq!(decl.methods.len(), 1, "constructors are not members");
        assert_eq!(
            decl.methods[0].ty,
            JavaType::Array(Box::new(JavaType::Class("java/lang/String".to_string())))
        );
        assert!(decl.complete);
    }

    #[test]
    fn test_rejects_bad_magic_and_truncation() {
        assert!(matches!(
            parse_class(&[0, 1, 2, 3, 4, 5, 6, 7]),
            Err(ClassParseError::InvalidMagic)
        ));

        let bytes = ClassFileBuilder::new("pkg/A").build();
        assert!(matches!(
            parse_class(&bytes[..bytes.len() - 3]),
            Err(ClassParseError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_method_descriptor() {
        let (params, ret) = parse_method_descriptor("(Ljava/lang/String;[IZ)V").unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].to_string(), "int[]");
        assert_eq!(ret, JavaType::Primitive("void".to_string()));

        assert!(parse_method_descriptor("(Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("II").is_err());
        assert!(parse_field_descriptor("Q").is_err());
    }

    #[test]
    fn test_array_dimension_limit() {
        let widest = format!("{}I", "[".repeat(255));
        let ty = parse_field_descriptor(&widest).unwrap();
        assert!(ty.to_string().ends_with("[]"));
        assert_eq!(ty.to_string().matches("[]").count(), 255);

        let too_wide = format!("{}I", "[".repeat(256));
        assert!(matches!(
            parse_field_descriptor(&too_wide),
            Err(ClassParseError::TooManyDimensions(_))
        ));
        let huge = format!("({}I)V", "[".repeat(100_000));
        assert!(matches!(
            parse_method_descriptor(&huge),
            Err(ClassParseError::TooManyDimensions(_))
        ));

        let bytes = ClassFileBuilder::new("pkg/Wide").field("cells", &too_wide).build();
        assert!(matches!(
            parse_class(&bytes),
            Err(ClassParseError::TooManyDimensions(_))
        ));
    }
}
