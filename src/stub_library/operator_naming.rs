//! Operator and cast naming (§4.3.7). Ported from `scriptLibrary.cpp`'s
//! `buildFunction`/`formatOperatorName`/`formatCastName`. Operators and
//! casts may only be declared at module scope; the user-facing name
//! (`opAdd`, …) is stashed in `operator_symbol` and the function's `name`
//! is overwritten with a mangled name so overloads of the same operator
//! never collide in a class's/module's member map.

use super::StubLibrary;
use crate::stubs::ids::{FunctionId, StubOwner, TypeDeclId};
use crate::stubs::kinds::TypeDecl;
use crate::stubs::{ArgFlags, FunctionFlags};

impl StubLibrary {
    pub fn name_operators_and_casts(&mut self) {
        let ids: Vec<FunctionId> = self.functions.ids().collect();
        for id in ids {
            let flags = self.functions.get(id).flags;
            if flags.contains(FunctionFlags::OPERATOR) {
                self.name_operator(id);
            } else if flags.contains(FunctionFlags::CAST) {
                self.name_cast(id);
            }
        }
    }

    fn name_operator(&mut self, id: FunctionId) {
        let (owner, location) = {
            let f = self.functions.get(id);
            (f.owner, f.location)
        };
        let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();

        if matches!(owner, StubOwner::Class(_)) {
            self.errors.report_error(path.clone(), location.line, "operators may only be declared at module scope");
            return;
        }

        // Hack for unary/binary operators whose meaning depends on arity.
        let name = self.functions.get(id).name.resolve(&self.strings).to_string();
        let arg_count = self.functions.get(id).args.len();
        if name == "opSubtract" && arg_count == 1 {
            self.rename_operator(id, "opNegate");
        } else if name == "opAdd" && arg_count == 1 {
            self.rename_operator(id, "opPlus");
        } else if name == "opIncrement" && arg_count == 2 {
            self.rename_operator(id, "opPostIncrement");
            self.functions.get_mut(id).args.truncate(1);
        } else if name == "opDecrement" && arg_count == 2 {
            self.rename_operator(id, "opPostDecrement");
            self.functions.get_mut(id).args.truncate(1);
        }

        let name = self.functions.get(id).name.resolve(&self.strings).to_string();
        if is_unary_operator(&name) {
            let args = self.functions.get(id).args.clone();
            if args.len() != 1 {
                self.errors.report_error(path.clone(), location.line, format!("unary operator `{name}` should take one argument"));
                return;
            }
            if name.starts_with("opIncrement")
                || name.starts_with("opDecrement")
                || name.starts_with("opPostIncrement")
                || name.starts_with("opPostDecrement")
            {
                let out = self.function_args.get(args[0]).flags.contains(ArgFlags::OUT);
                if !out {
                    self.errors.report_error(path.clone(), location.line, "operator's first argument should be passed by output reference (out)");
                    return;
                }
            }
        } else if self.functions.get(id).args.len() != 2 {
            self.errors.report_error(path.clone(), location.line, format!("binary operator `{name}` should take two arguments"));
            return;
        }

        if self.functions.get(id).return_type.is_none() {
            self.errors.report_error(path, location.line, "operator should return a value");
            return;
        }

        let symbol = self.functions.get(id).name;
        self.functions.get_mut(id).operator_symbol = Some(symbol);
        let mangled = self.format_operator_name_string(id);
        let interned = self.strings.intern(&mangled);
        self.functions.get_mut(id).name = interned;
    }

    fn rename_operator(&mut self, id: FunctionId, new_name: &str) {
        let interned = self.strings.intern(new_name);
        self.functions.get_mut(id).name = interned;
    }

    fn name_cast(&mut self, id: FunctionId) {
        let (owner, location) = {
            let f = self.functions.get(id);
            (f.owner, f.location)
        };
        let path = self.file_of_owner(owner).map(|f| self.file_abs_path(f)).unwrap_or_default();

        if matches!(owner, StubOwner::Class(_)) {
            self.errors.report_error(path.clone(), location.line, "casts may only be declared at module scope");
            return;
        }

        if self.functions.get(id).args.len() != 1 {
            self.errors.report_error(path.clone(), location.line, "cast operator should take one argument");
            return;
        }
        if self.functions.get(id).return_type.is_none() {
            self.errors.report_error(path, location.line, "cast operator should return a value");
            return;
        }

        let mangled = self.format_cast_name_string(id);
        let interned = self.strings.intern(&mangled);
        self.functions.get_mut(id).name = interned;
    }

    /// `operatorName + "_" + (ref_/out_)? + argType for each arg + "_" +
    /// returnType`.
    fn format_operator_name_string(&self, id: FunctionId) -> String {
        let f = self.functions.get(id);
        let mut name = f.operator_symbol.map(|s| s.resolve(&self.strings).to_string()).unwrap_or_default();
        for &arg in &f.args {
            let a = self.function_args.get(arg);
            name.push('_');
            if a.flags.contains(ArgFlags::REF) {
                name.push_str("ref_");
            }
            if a.flags.contains(ArgFlags::OUT) {
                name.push_str("out_");
            }
            name.push_str(&self.format_type_name(a.type_decl));
        }
        if let Some(ret) = f.return_type {
            name.push('_');
            name.push_str(&self.format_type_name(ret));
        }
        name
    }

    fn format_cast_name_string(&self, id: FunctionId) -> String {
        let f = self.functions.get(id);
        let mut name = String::from("cast");
        for &arg in &f.args {
            let a = self.function_args.get(arg);
            name.push('_');
            name.push_str(&self.format_type_name(a.type_decl));
        }
        if let Some(ret) = f.return_type {
            name.push('_');
            name.push_str(&self.format_type_name(ret));
        }
        name
    }

    fn format_type_name(&self, decl: TypeDeclId) -> String {
        match self.type_decls.get(decl) {
            TypeDecl::Engine(e) => e.name().to_string(),
            TypeDecl::Simple(r) => self.resolved_symbol_name(*r),
            TypeDecl::ClassType(r) => format!("class_{}", self.resolved_symbol_name(*r)),
            TypeDecl::PtrType(r) => format!("ptr_{}", self.resolved_symbol_name(*r)),
            TypeDecl::WeakPtrType(r) => format!("weak_{}", self.resolved_symbol_name(*r)),
            TypeDecl::DynamicArrayType { inner } => format!("array_{}", self.format_type_name(*inner)),
            TypeDecl::StaticArrayType { inner, .. } => format!("sarray_{}", self.format_type_name(*inner)),
        }
    }

    fn resolved_symbol_name(&self, type_ref: crate::stubs::ids::TypeRefId) -> String {
        match self.type_refs.get(type_ref).resolved {
            Some(crate::stubs::ResolvedSymbol::Class(c)) => self.classes.get(c).name.resolve(&self.strings).to_string(),
            Some(crate::stubs::ResolvedSymbol::Enum(e)) => self.enums.get(e).name.resolve(&self.strings).to_string(),
            Some(crate::stubs::ResolvedSymbol::TypeName(t)) => self.type_names.get(t).name.resolve(&self.strings).to_string(),
            None => String::new(),
        }
    }
}

fn is_unary_operator(name: &str) -> bool {
    if name.starts_with("opNotEqual") {
        return false;
    }
    name.starts_with("opIncrement")
        || name.starts_with("opDecrement")
        || name.starts_with("opPostIncrement")
        || name.starts_with("opPostDecrement")
        || name.starts_with("opBinaryNot")
        || name.starts_with("opNot")
        || name.starts_with("opNegate")
}
