// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Strongly-typed handles for every resource kind managed by a [`Renderer`].
//!
//! Each handle wraps a [`RawHandle`] issued by the backend's pool for that kind, so a
//! texture handle can never be passed where a program handle is expected.
//!
//! [`Renderer`]: crate::renderer::Renderer

use crate::memory::RawHandle;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub RawHandle);

        impl $name {
            /// The handle that never identifies a live resource.
            pub const EMPTY: $name = $name(RawHandle::EMPTY);

            /// Returns `true` for the empty handle.
            pub const fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// The pool handle behind this typed handle.
            pub const fn raw(&self) -> RawHandle {
                self.0
            }
        }

        impl From<RawHandle> for $name {
            fn from(raw: RawHandle) -> Self {
                $name(raw)
            }
        }
    };
}

define_handle!(
    /// A 2D or cube texture.
    TextureHandle
);
define_handle!(
    /// A render target made of colour attachments and a depth buffer.
    FrameBufferHandle
);
define_handle!(
    /// A static or dynamic vertex buffer.
    VertexBufferHandle
);
define_handle!(
    /// A 16-bit index buffer.
    IndexBufferHandle
);
define_handle!(
    /// A linked vertex + fragment program.
    ProgramHandle
);
define_handle!(
    /// The wiring of one or more vertex buffers to a program's inputs.
    VertexBindingHandle
);
define_handle!(
    /// A named value slot on a program.
    UniformHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_handles_are_default() {
        assert!(TextureHandle::default().is_empty());
        assert_eq!(ProgramHandle::default(), ProgramHandle::EMPTY);
    }

    #[test]
    fn typed_handle_round_trips_raw() {
        let raw = RawHandle::new(3, 7);
        let handle = UniformHandle::from(raw);
        assert_eq!(handle.raw(), raw);
        assert!(!handle.is_empty());
    }
}
