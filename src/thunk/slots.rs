//! Process-wide trampoline slots.
//!
//! Rust cannot emit a new `extern "C"` function at runtime, so every shape
//! gets a compile-time table of [`SLOT_CAPACITY`] trampolines and a bank of
//! as many slots. Trampoline `N` of a shape calls the body stored in slot `N`
//! of that shape's bank. A slot is handed out once; rebinding it replaces the
//! body while the pointer stays the same, so reloading a plugin does not use
//! up slots.

use std::{
    any::Any,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use super::CallableTypeDescriptor;
use crate::{
    describe::Signature,
    types::{NATIVE_TYPE_COUNT, NativePtr, NativeType},
};

/// Number of trampolines generated per shape, and therefore the number of
/// distinct functions of one shape a process can bind.
pub const SLOT_CAPACITY: usize = 256;

/// One bank per `() -> R` shape, then one per `(A) -> R` shape.
const BANK_COUNT: usize = NATIVE_TYPE_COUNT * (NATIVE_TYPE_COUNT + 1);

/// Body of a zero-argument unit.
pub(crate) type Body0<R> = Box<dyn Fn() -> R + Send + Sync>;

/// Body of a one-argument unit.
pub(crate) type Body1<A, R> = Box<dyn Fn(A) -> R + Send + Sync>;

/// A body with its shape erased. Holds a [`Body0`] or a [`Body1`].
pub(crate) type ErasedBody = Arc<dyn Any + Send + Sync>;

struct SlotEntry {
    name: String,
    body: ErasedBody,
}

impl SlotEntry {
    fn body<T: 'static>(&self, slot: usize) -> Option<&T> {
        let body = self.body.downcast_ref::<T>();
        if body.is_none() {
            tracing::error!(unit = %self.name, slot, "trampoline called with a body of another shape");
        }
        body
    }
}

/// The slots of one shape.
struct Bank {
    slots: [RwLock<Option<Arc<SlotEntry>>>; SLOT_CAPACITY],
    next: AtomicUsize,
}

impl Bank {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| RwLock::new(None)),
            next: AtomicUsize::new(0),
        }
    }

    fn store(&self, slot: usize, name: &str, body: ErasedBody) {
        *self.slots[slot].write() = Some(Arc::new(SlotEntry {
            name: name.to_owned(),
            body,
        }));
    }
}

static BANKS: [OnceCell<Box<Bank>>; BANK_COUNT] = [const { OnceCell::new() }; BANK_COUNT];

fn bank(index: usize) -> &'static Bank {
    BANKS[index].get_or_init(|| Box::new(Bank::new()))
}

/// Stores a body in the next free slot of a bank and returns the slot index,
/// or `None` if every slot of the bank is taken.
pub(crate) fn bind(bank_index: usize, name: &str, body: ErasedBody) -> Option<usize> {
    let bank = bank(bank_index);
    let slot = bank
        .next
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
            (next < SLOT_CAPACITY).then_some(next + 1)
        })
        .ok()?;
    bank.store(slot, name, body);
    Some(slot)
}

/// Replaces the body stored in a slot handed out by [`bind`].
pub(crate) fn rebind(bank_index: usize, slot: usize, name: &str, body: ErasedBody) {
    if slot < SLOT_CAPACITY {
        bank(bank_index).store(slot, name, body);
    }
}

/// Number of slots handed out so far, over every shape.
pub fn slots_in_use() -> usize {
    BANKS
        .iter()
        .filter_map(OnceCell::get)
        .map(|bank| bank.next.load(Ordering::Acquire))
        .sum()
}

fn entry(bank_index: usize, slot: usize) -> Option<Arc<SlotEntry>> {
    BANKS[bank_index].get()?.slots[slot].read().clone()
}

fn report_panic(name: &str, payload: &(dyn Any + Send)) {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    tracing::error!(unit = name, "plugin function panicked: {message}");
}

#[allow(improper_ctypes_definitions)]
extern "C" fn thunk0<R: NativeType, const SLOT: usize>() -> R::Abi {
    let Some(entry) = entry(Shape0::<R>::BANK, SLOT) else {
        return R::fallback();
    };
    let Some(body) = entry.body::<Body0<R>>(SLOT) else {
        return R::fallback();
    };
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value.into_abi(),
        Err(payload) => {
            report_panic(&entry.name, payload.as_ref());
            R::fallback()
        }
    }
}

#[allow(improper_ctypes_definitions)]
extern "C" fn thunk1<A: NativeType, R: NativeType, const SLOT: usize>(arg: A::Abi) -> R::Abi {
    let Some(entry) = entry(Shape1::<A, R>::BANK, SLOT) else {
        return R::fallback();
    };
    let Some(body) = entry.body::<Body1<A, R>>(SLOT) else {
        return R::fallback();
    };
    match panic::catch_unwind(AssertUnwindSafe(|| body(A::from_abi(arg)))) {
        Ok(value) => value.into_abi(),
        Err(payload) => {
            report_panic(&entry.name, payload.as_ref());
            R::fallback()
        }
    }
}

/// Expands to an array holding one instantiation of a trampoline per slot.
macro_rules! slot_table {
    ($thunk: ident; $($ty: ty),+) => {
        slot_table!(@expand $thunk [$($ty),+];
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
            32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59 60
            61 62 63 64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79 80 81 82 83 84 85 86 87 88 89
            90 91 92 93 94 95 96 97 98 99 100 101 102 103 104 105 106 107 108 109 110 111 112 113
            114 115 116 117 118 119 120 121 122 123 124 125 126 127 128 129 130 131 132 133 134 135
            136 137 138 139 140 141 142 143 144 145 146 147 148 149 150 151 152 153 154 155 156 157
            158 159 160 161 162 163 164 165 166 167 168 169 170 171 172 173 174 175 176 177 178 179
            180 181 182 183 184 185 186 187 188 189 190 191 192 193 194 195 196 197 198 199 200 201
            202 203 204 205 206 207 208 209 210 211 212 213 214 215 216 217 218 219 220 221 222 223
            224 225 226 227 228 229 230 231 232 233 234 235 236 237 238 239 240 241 242 243 244 245
            246 247 248 249 250 251 252 253 254 255
        )
    };
    (@expand $thunk: ident $tys: tt; $($slot: literal)*) => {
        [$(slot_table!(@entry $thunk $tys $slot)),*]
    };
    (@entry $thunk: ident [$($ty: ty),+] $slot: literal) => {
        $thunk::<$($ty,)+ $slot>
    };
}

type Thunk0<R> = extern "C" fn() -> <R as NativeType>::Abi;
type Thunk1<A, R> = extern "C" fn(<A as NativeType>::Abi) -> <R as NativeType>::Abi;

/// Trampolines for units of shape `() -> R`.
pub(crate) struct Shape0<R>(PhantomData<R>);

impl<R: NativeType> Shape0<R> {
    const TABLE: &'static [Thunk0<R>; SLOT_CAPACITY] = &slot_table!(thunk0; R);
    const BANK: usize = R::INDEX;

    fn pointer(slot: usize) -> Option<NativePtr> {
        Self::TABLE.get(slot).map(|f| NativePtr::from_fn0::<R>(*f))
    }

    pub(crate) fn descriptor(signature: &Signature) -> CallableTypeDescriptor {
        CallableTypeDescriptor::new(signature.clone(), Self::BANK, Self::pointer)
    }
}

/// Trampolines for units of shape `(A) -> R`.
pub(crate) struct Shape1<A, R>(PhantomData<(A, R)>);

impl<A: NativeType, R: NativeType> Shape1<A, R> {
    const TABLE: &'static [Thunk1<A, R>; SLOT_CAPACITY] = &slot_table!(thunk1; A, R);
    const BANK: usize = NATIVE_TYPE_COUNT * (1 + A::INDEX) + R::INDEX;

    fn pointer(slot: usize) -> Option<NativePtr> {
        Self::TABLE
            .get(slot)
            .map(|f| NativePtr::from_fn1::<A, R>(*f))
    }

    pub(crate) fn descriptor(signature: &Signature) -> CallableTypeDescriptor {
        CallableTypeDescriptor::new(signature.clone(), Self::BANK, Self::pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectHandle;

    #[test]
    fn test_tables_hold_distinct_trampolines() {
        let first = Shape0::<i32>::pointer(0).unwrap();
        let second = Shape0::<i32>::pointer(1).unwrap();
        assert_ne!(first, second);
        assert!(Shape0::<i32>::pointer(SLOT_CAPACITY).is_none());
    }

    #[test]
    fn test_shapes_have_distinct_banks() {
        let banks = [
            Shape0::<()>::BANK,
            Shape0::<ObjectHandle>::BANK,
            Shape1::<(), ()>::BANK,
            Shape1::<ObjectHandle, bool>::BANK,
            Shape1::<bool, ObjectHandle>::BANK,
            Shape1::<ObjectHandle, ObjectHandle>::BANK,
        ];
        for (i, bank) in banks.iter().enumerate() {
            assert!(*bank < BANK_COUNT);
            assert!(!banks[..i].contains(bank));
        }
        assert_eq!(Shape1::<ObjectHandle, ObjectHandle>::BANK, BANK_COUNT - 1);
    }

    #[test]
    fn test_bound_slot_is_callable() {
        let body: Body1<i32, i32> = Box::new(|x| x * 3);
        let bank = Shape1::<i32, i32>::BANK;
        let slot = bind(bank, "Test.Triple", Arc::new(body)).unwrap();
        let ptr = Shape1::<i32, i32>::pointer(slot).unwrap();
        assert_eq!(unsafe { ptr.call1::<i32, i32>(14) }, 42);
        assert!(slots_in_use() > slot);
    }

    #[test]
    fn test_rebind_keeps_pointer() {
        let bank = Shape1::<u8, u16>::BANK;
        let body: Body1<u8, u16> = Box::new(|x| u16::from(x) + 1);
        let slot = bind(bank, "Test.Next", Arc::new(body)).unwrap();
        let ptr = Shape1::<u8, u16>::pointer(slot).unwrap();
        assert_eq!(unsafe { ptr.call1::<u8, u16>(1) }, 2);

        let body: Body1<u8, u16> = Box::new(|x| u16::from(x) * 100);
        rebind(bank, slot, "Test.Next", Arc::new(body));
        assert_eq!(unsafe { ptr.call1::<u8, u16>(3) }, 300);
    }

    #[test]
    fn test_bank_capacity_is_bounded() {
        let bank = Shape1::<i8, i8>::BANK;
        let mut bound = 0;
        while bind(bank, "Test.Fill", Arc::new(Box::new(|x: i8| x) as Body1<i8, i8>)).is_some() {
            bound += 1;
        }
        assert!(bound <= SLOT_CAPACITY);
        assert_eq!(BANKS[bank].get().unwrap().next.load(Ordering::Acquire), SLOT_CAPACITY);
        assert!(bind(bank, "Test.Fill", Arc::new(Box::new(|x: i8| x) as Body1<i8, i8>)).is_none());
    }

    #[test]
    fn test_panicking_body_returns_fallback() {
        let body: Body0<u64> = Box::new(|| panic!("boom"));
        let slot = bind(Shape0::<u64>::BANK, "Test.Boom", Arc::new(body)).unwrap();
        let ptr = Shape0::<u64>::pointer(slot).unwrap();
        assert_eq!(unsafe { ptr.call0::<u64>() }, 0);
    }

    #[test]
    fn test_unbound_slot_returns_fallback() {
        let ptr = Shape0::<i16>::pointer(SLOT_CAPACITY - 1).unwrap();
        assert_eq!(unsafe { ptr.call0::<i16>() }, 0);
    }
}
