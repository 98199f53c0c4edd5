//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution and the call protocol.

use std::io::Write;

use bytecode_system::{decode, Disassembler, OpCode, Operand};
use core_types::{ObjRef, RuntimeError, RuntimeErrorKind, Value};
use memory_manager::{
    Obj, ObjBoundMethod, ObjClass, ObjClosure, ObjInstance, ObjType, TABLE_ENTRY_SIZE,
};

use crate::call_frame::CallFrame;
use crate::vm::Vm;

impl Vm {
    /// Execute until the outermost frame returns.
    pub(crate) fn run(&mut self, out: &mut dyn Write) -> Result<Value, RuntimeError> {
        loop {
            let frame = *self.frame();
            let chunk = &self.heap.as_function(frame.function).chunk;
            let inst = match decode(chunk, frame.ip, &self.heap) {
                Ok(inst) => inst,
                Err(err) => {
                    self.frame_mut().ip = frame.ip + 1;
                    return Err(self.runtime_error(RuntimeErrorKind::InvalidOpcode, err.to_string()));
                }
            };
            if tracing::enabled!(target: "vm::exec", tracing::Level::TRACE) {
                self.trace_instruction(frame.function, frame.ip);
            }
            self.frame_mut().ip = inst.next_offset();

            match (inst.opcode, inst.operand) {
                (OpCode::Constant | OpCode::ConstantLong, Operand::Constant(index)) => {
                    let value = self.read_constant(index)?;
                    self.push(value)?;
                }
                (OpCode::Nil, _) => self.push(Value::Nil)?,
                (OpCode::True, _) => self.push(Value::Bool(true))?,
                (OpCode::False, _) => self.push(Value::Bool(false))?,
                (OpCode::Pop, _) => {
                    self.pop();
                }
                (OpCode::GetLocal, Operand::Byte(slot)) => {
                    let value = self.stack[frame.base + slot as usize];
                    self.push(value)?;
                }
                (OpCode::SetLocal, Operand::Byte(slot)) => {
                    let value = self.peek(0);
                    self.stack[frame.base + slot as usize] = value;
                }
                (OpCode::GetGlobal, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    match self.globals.get(&name).copied() {
                        Some(value) => self.push(value)?,
                        None => return Err(self.undefined_variable(name)),
                    }
                }
                (OpCode::DefineGlobal, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    let value = self.peek(0);
                    self.globals.insert(name, value);
                    self.pop();
                }
                (OpCode::SetGlobal, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    let value = self.peek(0);
                    match self.globals.get_mut(&name) {
                        Some(slot) => *slot = value,
                        None => return Err(self.undefined_variable(name)),
                    }
                }
                (OpCode::GetUpvalue, Operand::Byte(index)) => {
                    let value = self.read_upvalue(frame.closure, index as usize);
                    self.push(value)?;
                }
                (OpCode::SetUpvalue, Operand::Byte(index)) => {
                    let value = self.peek(0);
                    self.write_upvalue(frame.closure, index as usize, value);
                }
                (OpCode::GetProperty, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    self.get_property(name)?;
                }
                (OpCode::SetProperty, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    self.set_property(name)?;
                }
                (OpCode::GetSuper, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    let superclass = self.pop_class()?;
                    self.bind_method(superclass, name)?;
                }
                (OpCode::Equal, _) => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b))?;
                }
                (OpCode::NotEqual, _) => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a != b))?;
                }
                (OpCode::Greater, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Bool(a > b))?;
                }
                (OpCode::GreaterEqual, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Bool(a >= b))?;
                }
                (OpCode::Less, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Bool(a < b))?;
                }
                (OpCode::LessEqual, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Bool(a <= b))?;
                }
                (OpCode::Add, _) => self.add()?,
                (OpCode::Subtract, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Number(a - b))?;
                }
                (OpCode::Multiply, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Number(a * b))?;
                }
                (OpCode::Divide, _) => {
                    let (a, b) = self.number_operands()?;
                    self.push(Value::Number(a / b))?;
                }
                (OpCode::Not, _) => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()))?;
                }
                (OpCode::Negate, _) => match self.peek(0) {
                    Value::Number(n) => {
                        self.pop();
                        self.push(Value::Number(-n))?;
                    }
                    _ => {
                        return Err(self.runtime_error(
                            RuntimeErrorKind::TypeError,
                            "Operand must be a number.",
                        ))
                    }
                },
                (OpCode::Print, _) => {
                    let value = self.pop();
                    let text = self.heap.render(value);
                    if let Err(err) = writeln!(out, "{}", text) {
                        return Err(self.runtime_error(RuntimeErrorKind::Io, err.to_string()));
                    }
                }
                (OpCode::Jump | OpCode::Loop, Operand::Jump { target }) => {
                    self.frame_mut().ip = target;
                }
                (OpCode::JumpIfFalse, Operand::Jump { target }) => {
                    if self.peek(0).is_falsey() {
                        self.frame_mut().ip = target;
                    }
                }
                (OpCode::Call, Operand::Byte(arg_count)) => {
                    let callee = self.peek(arg_count as usize);
                    self.call_value(callee, arg_count)?;
                }
                (
                    OpCode::Invoke,
                    Operand::Invoke {
                        constant,
                        arg_count,
                    },
                ) => {
                    let name = self.read_string(constant)?;
                    self.invoke(name, arg_count)?;
                }
                (
                    OpCode::SuperInvoke,
                    Operand::Invoke {
                        constant,
                        arg_count,
                    },
                ) => {
                    let name = self.read_string(constant)?;
                    let superclass = self.pop_class()?;
                    self.invoke_from_class(superclass, name, arg_count)?;
                }
                (OpCode::Closure, Operand::Closure { constant, captures }) => {
                    let value = self.read_constant(constant)?;
                    let function = match value {
                        Value::Obj(obj) if self.heap.is_obj_type(value, ObjType::Function) => obj,
                        _ => {
                            return Err(self.runtime_error(
                                RuntimeErrorKind::InvalidOpcode,
                                "Closure constant is not a function.",
                            ))
                        }
                    };
                    let upvalues = captures
                        .iter()
                        .map(|capture| {
                            if capture.is_local {
                                self.capture_upvalue(frame.base + capture.index as usize)
                            } else {
                                self.heap.as_closure(frame.closure).upvalues
                                    [capture.index as usize]
                            }
                        })
                        .collect();
                    let closure = self.alloc(Obj::Closure(ObjClosure { function, upvalues }));
                    self.push(Value::Obj(closure))?;
                }
                (OpCode::CloseUpvalue, _) => {
                    self.close_upvalues(self.stack.len() - 1);
                    self.pop();
                }
                (OpCode::Class, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    let class = self.alloc(Obj::Class(ObjClass::new(name)));
                    self.push(Value::Obj(class))?;
                }
                (OpCode::Inherit, _) => self.inherit()?,
                (OpCode::Method, Operand::Constant(index)) => {
                    let name = self.read_string(index)?;
                    self.define_method(name);
                }
                (OpCode::Return, _) => {
                    let result = self.pop();
                    self.close_upvalues(frame.base);
                    self.frames.pop();
                    self.stack.truncate(frame.base);
                    if self.frames.is_empty() {
                        return Ok(result);
                    }
                    self.push(result)?;
                }
                (opcode, operand) => {
                    unreachable!("{} decoded with operand {:?}", opcode.name(), operand)
                }
            }
        }
    }

    fn frame(&self) -> &CallFrame {
        let Some(frame) = self.frames.last() else {
            unreachable!("dispatch with an empty call stack");
        };
        frame
    }

    fn frame_mut(&mut self) -> &mut CallFrame {
        let Some(frame) = self.frames.last_mut() else {
            unreachable!("dispatch with an empty call stack");
        };
        frame
    }

    fn trace_instruction(&self, function: ObjRef, ip: usize) {
        let stack: String = self
            .stack
            .iter()
            .map(|value| format!("[ {} ]", self.heap.render(*value)))
            .collect();
        let chunk = &self.heap.as_function(function).chunk;
        let (row, _) = Disassembler::new(chunk, &self.heap).instruction(ip);
        tracing::trace!(target: "vm::exec", "          {}", stack);
        tracing::trace!(target: "vm::exec", "{}", row);
    }

    fn read_constant(&mut self, index: usize) -> Result<Value, RuntimeError> {
        let function = self.frame().function;
        match self.heap.as_function(function).chunk.constant(index) {
            Some(value) => Ok(value),
            None => Err(self.runtime_error(
                RuntimeErrorKind::InvalidOpcode,
                format!("Constant index {} out of range.", index),
            )),
        }
    }

    /// A name operand: a constant that must be an interned string.
    fn read_string(&mut self, index: usize) -> Result<ObjRef, RuntimeError> {
        let value = self.read_constant(index)?;
        match value {
            Value::Obj(obj) if self.heap.is_obj_type(value, ObjType::String) => Ok(obj),
            _ => Err(self.runtime_error(
                RuntimeErrorKind::InvalidOpcode,
                format!("Constant {} is not a name.", index),
            )),
        }
    }

    fn undefined_variable(&mut self, name: ObjRef) -> RuntimeError {
        let message = format!("Undefined variable '{}'.", self.heap.as_str(name));
        self.runtime_error(RuntimeErrorKind::UndefinedVariable, message)
    }

    fn undefined_property(&mut self, name: ObjRef) -> RuntimeError {
        let message = format!("Undefined property '{}'.", self.heap.as_str(name));
        self.runtime_error(RuntimeErrorKind::UndefinedProperty, message)
    }

    /// Pop both operands of a numeric binary operator.
    fn number_operands(&mut self) -> Result<(f64, f64), RuntimeError> {
        match (self.peek(1), self.peek(0)) {
            (Value::Number(a), Value::Number(b)) => {
                self.stack.truncate(self.stack.len() - 2);
                Ok((a, b))
            }
            _ => Err(self.runtime_error(RuntimeErrorKind::TypeError, "Operands must be numbers.")),
        }
    }

    fn add(&mut self) -> Result<(), RuntimeError> {
        let b = self.peek(0);
        let a = self.peek(1);
        let result = match (a, b) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ if self.heap.is_obj_type(a, ObjType::String)
                || self.heap.is_obj_type(b, ObjType::String) =>
            {
                let joined = format!("{}{}", self.heap.render(a), self.heap.render(b));
                Value::Obj(self.intern(&joined))
            }
            _ => {
                return Err(self.runtime_error(
                    RuntimeErrorKind::TypeError,
                    "Operands must be two numbers or two strings.",
                ))
            }
        };
        self.stack.truncate(self.stack.len() - 2);
        self.push(result)
    }

    fn instance(&self, value: Value) -> Option<ObjRef> {
        match value {
            Value::Obj(obj) if self.heap.is_obj_type(value, ObjType::Instance) => Some(obj),
            _ => None,
        }
    }

    fn pop_class(&mut self) -> Result<ObjRef, RuntimeError> {
        let value = self.pop();
        match value {
            Value::Obj(obj) if self.heap.is_obj_type(value, ObjType::Class) => Ok(obj),
            _ => Err(self.runtime_error(
                RuntimeErrorKind::TypeError,
                "Superclass must be a class.",
            )),
        }
    }

    fn get_property(&mut self, name: ObjRef) -> Result<(), RuntimeError> {
        let Some(instance) = self.instance(self.peek(0)) else {
            return Err(self.runtime_error(
                RuntimeErrorKind::TypeError,
                "Only instances have properties.",
            ));
        };
        let instance = self.heap.as_instance(instance);
        let (field, class) = (instance.fields.get(&name).copied(), instance.class);
        match field {
            Some(value) => {
                self.pop();
                self.push(value)
            }
            None => self.bind_method(class, name),
        }
    }

    fn set_property(&mut self, name: ObjRef) -> Result<(), RuntimeError> {
        let Some(instance) = self.instance(self.peek(1)) else {
            return Err(self.runtime_error(
                RuntimeErrorKind::TypeError,
                "Only instances have fields.",
            ));
        };
        let value = self.peek(0);
        let added = self
            .heap
            .as_instance_mut(instance)
            .fields
            .insert(name, value)
            .is_none();
        if added {
            self.account_growth(instance, TABLE_ENTRY_SIZE);
        }
        self.stack.truncate(self.stack.len() - 2);
        self.push(value)
    }

    /// Replace the receiver on top of the stack with `class`'s method
    /// `name` bound to it.
    fn bind_method(&mut self, class: ObjRef, name: ObjRef) -> Result<(), RuntimeError> {
        let Some(Value::Obj(method)) = self.heap.as_class(class).methods.get(&name).copied() else {
            return Err(self.undefined_property(name));
        };
        let receiver = self.peek(0);
        let bound = self.alloc(Obj::BoundMethod(ObjBoundMethod { receiver, method }));
        self.pop();
        self.push(Value::Obj(bound))
    }

    fn inherit(&mut self) -> Result<(), RuntimeError> {
        let superclass = self.peek(1);
        if !self.heap.is_obj_type(superclass, ObjType::Class) {
            return Err(self.runtime_error(
                RuntimeErrorKind::TypeError,
                "Superclass must be a class.",
            ));
        }
        let (Value::Obj(superclass), Value::Obj(subclass)) = (superclass, self.peek(0)) else {
            unreachable!("class operands are objects");
        };
        let methods = self.heap.as_class(superclass).methods.clone();
        let count = methods.len();
        self.heap.as_class_mut(subclass).methods.extend(methods);
        self.account_growth(subclass, count * TABLE_ENTRY_SIZE);
        self.pop();
        Ok(())
    }

    fn define_method(&mut self, name: ObjRef) {
        let method = self.peek(0);
        let Value::Obj(class) = self.peek(1) else {
            unreachable!("method defined outside a class body");
        };
        let added = self
            .heap
            .as_class_mut(class)
            .methods
            .insert(name, method)
            .is_none();
        if added {
            self.account_growth(class, TABLE_ENTRY_SIZE);
        }
        self.pop();
    }

    fn call_value(&mut self, callee: Value, arg_count: u8) -> Result<(), RuntimeError> {
        let Value::Obj(obj) = callee else {
            return Err(self.not_callable());
        };
        match self.heap.obj_type(callee) {
            Some(ObjType::Closure) => self.call_closure(obj, arg_count),
            Some(ObjType::BoundMethod) => {
                let bound = *self.heap.as_bound_method(obj);
                let slot = self.stack.len() - arg_count as usize - 1;
                self.stack[slot] = bound.receiver;
                self.call_closure(bound.method, arg_count)
            }
            Some(ObjType::Class) => {
                let instance = self.alloc(Obj::Instance(ObjInstance::new(obj)));
                let slot = self.stack.len() - arg_count as usize - 1;
                self.stack[slot] = Value::Obj(instance);
                match self.heap.as_class(obj).methods.get(&self.init_string).copied() {
                    Some(Value::Obj(init)) => self.call_closure(init, arg_count),
                    _ if arg_count != 0 => Err(self.runtime_error(
                        RuntimeErrorKind::ArityMismatch,
                        format!("Expected 0 arguments but got {}.", arg_count),
                    )),
                    _ => Ok(()),
                }
            }
            Some(ObjType::Native) => {
                let native = self.heap.as_native(obj).function;
                let args_start = self.stack.len() - arg_count as usize;
                match native(&self.stack[args_start..]) {
                    Ok(result) => {
                        self.stack.truncate(args_start - 1);
                        self.push(result)
                    }
                    Err(message) => Err(self.runtime_error(RuntimeErrorKind::NativeError, message)),
                }
            }
            _ => Err(self.not_callable()),
        }
    }

    fn not_callable(&mut self) -> RuntimeError {
        self.runtime_error(
            RuntimeErrorKind::NotCallable,
            "Can only call functions and classes.",
        )
    }

    /// Push a frame for `closure` whose callee slot and arguments are
    /// already on the stack.
    pub(crate) fn call_closure(&mut self, closure: ObjRef, arg_count: u8) -> Result<(), RuntimeError> {
        let function = self.heap.as_closure(closure).function;
        let arity = self.heap.as_function(function).arity;
        if arg_count != arity {
            return Err(self.runtime_error(
                RuntimeErrorKind::ArityMismatch,
                format!("Expected {} arguments but got {}.", arity, arg_count),
            ));
        }
        if self.frames.is_full() {
            return Err(self.runtime_error(RuntimeErrorKind::StackOverflow, "Stack overflow."));
        }
        let base = self.stack.len() - arg_count as usize - 1;
        self.frames.push(CallFrame::new(closure, function, base));
        Ok(())
    }

    fn invoke(&mut self, name: ObjRef, arg_count: u8) -> Result<(), RuntimeError> {
        let Some(instance) = self.instance(self.peek(arg_count as usize)) else {
            return Err(self.runtime_error(
                RuntimeErrorKind::TypeError,
                "Only instances have methods.",
            ));
        };
        let instance = self.heap.as_instance(instance);
        let (field, class) = (instance.fields.get(&name).copied(), instance.class);
        match field {
            Some(field) => {
                let slot = self.stack.len() - arg_count as usize - 1;
                self.stack[slot] = field;
                self.call_value(field, arg_count)
            }
            None => self.invoke_from_class(class, name, arg_count),
        }
    }

    fn invoke_from_class(
        &mut self,
        class: ObjRef,
        name: ObjRef,
        arg_count: u8,
    ) -> Result<(), RuntimeError> {
        match self.heap.as_class(class).methods.get(&name).copied() {
            Some(Value::Obj(method)) => self.call_closure(method, arg_count),
            _ => Err(self.undefined_property(name)),
        }
    }
}
