// Lexical state carried through a single walk

use std::collections::HashMap;

use crate::resolve::JavaType;

/// Members of a type declared in the source being walked.
/// `None` types could not be resolved.
#[derive(Debug, Clone, Default)]
pub struct LocalType {
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: HashMap<String, Option<JavaType>>,
    pub methods: HashMap<String, Option<JavaType>>,
}

/// One enclosing class body
#[derive(Debug)]
pub struct TypeFrame {
    pub path: String,
    pub members: LocalType,
    /// Member and local class names declared in this body, mapped to paths
    pub nested: HashMap<String, String>,
    block_base: usize,
    method: Option<String>,
    anonymous_count: usize,
}

impl TypeFrame {
    /// Simple binary name: `Foo`, `Foo$Inner`, `Foo$1`
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// What an unqualified name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Local(Option<JavaType>),
    Field {
        declaring_type: String,
        ty: Option<JavaType>,
    },
}

#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<TypeFrame>,
    blocks: Vec<HashMap<String, Option<JavaType>>>,
    finished: HashMap<String, LocalType>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, path: String) {
        self.frames.push(TypeFrame {
            path,
            members: LocalType::default(),
            nested: HashMap::new(),
            block_base: self.blocks.len(),
            method: None,
            anonymous_count: 0,
        });
    }

    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.blocks.truncate(frame.block_base);
            self.finished.insert(frame.path, frame.members);
        }
    }

    pub fn frame(&self) -> Option<&TypeFrame> {
        self.frames.last()
    }

    pub fn frame_mut(&mut self) -> Option<&mut TypeFrame> {
        self.frames.last_mut()
    }

    /// Enclosing frames, innermost first
    pub fn frames(&self) -> impl Iterator<Item = &TypeFrame> {
        self.frames.iter().rev()
    }

    /// Members of a type declared in this source, enclosing or already walked
    pub fn local_type(&self, path: &str) -> Option<&LocalType> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.path == path)
            .map(|frame| &frame.members)
            .or_else(|| self.finished.get(path))
    }

    pub fn method(&self) -> Option<&str> {
        self.frame().and_then(|frame| frame.method.as_deref())
    }

    /// Replace the current frame's method, returning the previous one
    pub fn set_method(&mut self, method: Option<String>) -> Option<String> {
        match self.frames.last_mut() {
            Some(frame) => std::mem::replace(&mut frame.method, method),
            None => None,
        }
    }

    /// Binary path for the next anonymous class in the current frame
    pub fn next_anonymous_path(&mut self) -> String {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.anonymous_count += 1;
                format!("{}${}", frame.path, frame.anonymous_count)
            }
            None => "$1".to_string(),
        }
    }

    pub fn push_block(&mut self) {
        self.blocks.push(HashMap::new());
    }

    pub fn pop_block(&mut self) {
        let base = self.frame().map_or(0, |frame| frame.block_base);
        if self.blocks.len() > base {
            self.blocks.pop();
        }
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Option<JavaType>) {
        let base = self.frame().map_or(0, |frame| frame.block_base);
        if self.blocks.len() <= base {
            self.push_block();
        }
        if let Some(block) = self.blocks.last_mut() {
            block.insert(name.into(), ty);
        }
    }

    /// Resolve an unqualified variable name.
    ///
    /// Each frame's locals are searched before its fields, and a frame is
    /// searched completely before the one enclosing it. `inherited` looks up
    /// fields a frame inherits from its supertypes.
    pub fn lookup_variable<F>(&self, name: &str, inherited: F) -> Option<Variable>
    where
        F: Fn(&TypeFrame, &str) -> Option<(String, Option<JavaType>)>,
    {
        let mut upper = self.blocks.len();
        for frame in self.frames.iter().rev() {
            let base = frame.block_base.min(upper);
            if let Some(ty) = self.blocks[base..upper]
                .iter()
                .rev()
                .find_map(|block| block.get(name))
            {
                return Some(Variable::Local(ty.clone()));
            }
            if let Some(ty) = frame.members.fields.get(name) {
                return Some(Variable::Field {
                    declaring_type: frame.path.clone(),
                    ty: ty.clone(),
                });
            }
            if let Some((declaring_type, ty)) = inherited(frame, name) {
                return Some(Variable::Field { declaring_type, ty });
            }
            upper = base;
        }

        self.blocks[..upper]
            .iter()
            .rev()
            .find_map(|block| block.get(name))
            .map(|ty| Variable::Local(ty.clone()))
    }
}
